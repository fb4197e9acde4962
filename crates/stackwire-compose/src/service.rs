//! Assembly of the write-ready service record.

use serde::Serialize;

use stackwire_common::config::GeneratorConfig;
use stackwire_common::error::StackwireError;

use crate::definition::FieldValue;
use crate::device::normalize_devices;
use crate::naming::NamedDefinition;
use crate::volume::resolve_volumes;

/// A compiled service, serialized in fragment key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedService {
    /// Image reference.
    pub image: String,
    /// Hostname; always the service name.
    pub hostname: String,
    /// Container name; always the service name.
    pub container_name: String,
    /// Restart policy.
    pub restart: String,
    /// Command override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<FieldValue>,
    /// Network mode. Its presence suppresses `networks`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<FieldValue>,
    /// User.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<FieldValue>,
    /// Entrypoint override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<FieldValue>,
    /// Added capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_add: Option<FieldValue>,
    /// Dropped capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_drop: Option<FieldValue>,
    /// Kernel parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sysctls: Option<FieldValue>,
    /// Labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<FieldValue>,
    /// Normalized device mappings.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,
    /// Resolved volume binds.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    /// Environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<FieldValue>,
    /// Dependencies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<FieldValue>,
    /// Healthcheck.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<FieldValue>,
    /// Port mappings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<FieldValue>,
    /// Attached networks; empty when `network_mode` is set.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
}

/// The outcome of compiling one container.
#[derive(Debug)]
pub struct CompiledService {
    /// Final service name.
    pub name: String,
    /// The service record.
    pub service: ResolvedService,
    /// Volume entries that were skipped as malformed.
    pub rejected_volumes: Vec<StackwireError>,
}

/// Keeps a pass-through value only if it carries something.
fn present(value: Option<&FieldValue>) -> Option<FieldValue> {
    value.filter(|v| !v.is_empty()).cloned()
}

/// Compiles a named definition into its service record.
///
/// `networks` is attached unless the definition sets `network_mode`; the
/// runtime rejects services that declare both.
pub fn compile(named: &NamedDefinition, config: &GeneratorConfig) -> CompiledService {
    let NamedDefinition {
        assigned,
        definition,
    } = named;
    let fields = &definition.fields;

    let (volumes, rejected_volumes) = resolve_volumes(
        &config.bind_path,
        &assigned.folder,
        config.use_full_directory,
        &definition.volumes,
    );
    for err in &rejected_volumes {
        tracing::warn!(service = %assigned.name, error = %err, "skipping volume");
    }

    let networks = if fields.network_mode.is_some() {
        tracing::debug!(service = %assigned.name, "network_mode set, not attaching network");
        Vec::new()
    } else {
        vec![config.network_name.clone()]
    };

    let service = ResolvedService {
        image: definition.image.clone(),
        hostname: assigned.name.clone(),
        container_name: assigned.name.clone(),
        restart: definition
            .restart
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| config.restart_policy.clone()),
        command: present(fields.command.as_ref()),
        network_mode: present(fields.network_mode.as_ref()),
        user: present(fields.user.as_ref()),
        entrypoint: present(fields.entrypoint.as_ref()),
        cap_add: present(fields.cap_add.as_ref()),
        cap_drop: present(fields.cap_drop.as_ref()),
        sysctls: present(fields.sysctls.as_ref()),
        labels: present(fields.labels.as_ref()),
        devices: normalize_devices(&definition.devices),
        volumes,
        environment: present(fields.environment.as_ref()),
        depends_on: present(fields.depends_on.as_ref()),
        healthcheck: present(fields.healthcheck.as_ref()),
        ports: present(fields.ports.as_ref()),
        networks,
    };
    tracing::debug!(service = %assigned.name, image = %service.image, "compiled service");

    CompiledService {
        name: assigned.name.clone(),
        service,
        rejected_volumes,
    }
}
