//! Fragment documents and the master manifest.
//!
//! Each definition file yields one fragment holding its compiled services.
//! The master manifest declares the shared network and points at every
//! service through `extends`, so service bodies are never duplicated.

use std::path::PathBuf;

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::network::NetworkSpec;
use crate::service::ResolvedService;

/// Compiled services of one definition file.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Where the fragment is written.
    pub path: PathBuf,
    /// How the master manifest refers to the fragment.
    pub reference: String,
    /// Services in resolution order.
    pub services: Vec<(String, ResolvedService)>,
}

impl Fragment {
    /// Creates an empty fragment.
    #[must_use]
    pub fn new(path: PathBuf, reference: String) -> Self {
        Self {
            path,
            reference,
            services: Vec::new(),
        }
    }

    /// Returns `true` if no service compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

struct ServiceMap<'a>(&'a [(String, ResolvedService)]);

impl Serialize for ServiceMap<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, service) in self.0 {
            map.serialize_entry(name, service)?;
        }
        map.end()
    }
}

/// Serializes as `{services: {<name>: <service>, ...}}`.
impl Serialize for Fragment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("services", &ServiceMap(&self.services))?;
        map.end()
    }
}

/// Binds a service name to the fragment that defines it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Service name.
    pub name: String,
    /// Fragment path as written in the master manifest.
    pub file: String,
}

#[derive(Serialize)]
struct Extends<'a> {
    file: &'a str,
    service: &'a str,
}

#[derive(Serialize)]
struct EntryBody<'a> {
    extends: Extends<'a>,
}

struct EntryMap<'a>(&'a [ManifestEntry]);

impl Serialize for EntryMap<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(
                &entry.name,
                &EntryBody {
                    extends: Extends {
                        file: &entry.file,
                        service: &entry.name,
                    },
                },
            )?;
        }
        map.end()
    }
}

/// The top-level document: the shared network plus one entry per service.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterManifest {
    /// Shared network declaration.
    pub network: NetworkSpec,
    /// Entries in resolution order.
    pub entries: Vec<ManifestEntry>,
}

impl MasterManifest {
    /// Creates a manifest with no services yet.
    #[must_use]
    pub const fn new(network: NetworkSpec) -> Self {
        Self {
            network,
            entries: Vec::new(),
        }
    }

    /// Registers every service of `fragment`.
    pub fn include(&mut self, fragment: &Fragment) {
        self.entries
            .extend(fragment.services.iter().map(|(name, _)| ManifestEntry {
                name: name.clone(),
                file: fragment.reference.clone(),
            }));
    }
}

impl Serialize for MasterManifest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("networks", &self.network)?;
        map.serialize_entry("services", &EntryMap(&self.entries))?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str) -> ResolvedService {
        ResolvedService {
            image: "img".into(),
            hostname: name.into(),
            container_name: name.into(),
            restart: "always".into(),
            command: None,
            network_mode: None,
            user: None,
            entrypoint: None,
            cap_add: None,
            cap_drop: None,
            sysctls: None,
            labels: None,
            devices: Vec::new(),
            volumes: Vec::new(),
            environment: None,
            depends_on: None,
            healthcheck: None,
            ports: None,
            networks: vec!["cloud".into()],
        }
    }

    fn fragment() -> Fragment {
        let mut fragment = Fragment::new("composes/stack.yaml".into(), "composes/stack.yaml".into());
        fragment.services.push(("web".into(), service("web")));
        fragment.services.push(("web_2".into(), service("web_2")));
        fragment
    }

    #[test]
    fn fragment_lists_services_in_order() {
        let yaml = serde_yaml::to_string(&fragment()).expect("serialize");
        assert!(yaml.starts_with("services:\n  web:\n"), "got: {yaml}");
        let first = yaml.find("  web:").expect("web");
        let second = yaml.find("  web_2:").expect("web_2");
        assert!(first < second);
    }

    #[test]
    fn master_references_fragment_via_extends() {
        let network = NetworkSpec::new("cloud", "bridge", "172.20.0.0/24").expect("network");
        let mut manifest = MasterManifest::new(network);
        manifest.include(&fragment());

        let value = serde_yaml::to_value(&manifest).expect("serialize");
        assert_eq!(value["networks"]["cloud"]["driver"].as_str(), Some("bridge"));
        let web2 = &value["services"]["web_2"]["extends"];
        assert_eq!(web2["file"].as_str(), Some("composes/stack.yaml"));
        assert_eq!(web2["service"].as_str(), Some("web_2"));
        assert!(value["services"]["web"].get("image").is_none());
    }

    #[test]
    fn empty_fragment_is_empty() {
        assert!(Fragment::new(PathBuf::new(), String::new()).is_empty());
        assert!(!fragment().is_empty());
    }
}
