//! The shared network every service joins.

use serde::Serialize;
use serde::ser::SerializeMap;

use stackwire_common::config::GeneratorConfig;
use stackwire_common::error::{Result, StackwireError};

/// A user-defined network with a single IPAM pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSpec {
    /// Network name; also the key it is declared under.
    pub name: String,
    /// Network driver.
    pub driver: String,
    /// Subnet in CIDR notation.
    pub subnet: String,
    /// Gateway address derived from the subnet.
    pub gateway: String,
}

impl NetworkSpec {
    /// Builds the network, deriving its gateway from `subnet`.
    ///
    /// # Errors
    ///
    /// Returns an error if `subnet` has no dotted address part.
    pub fn new(
        name: impl Into<String>,
        driver: impl Into<String>,
        subnet: impl Into<String>,
    ) -> Result<Self> {
        let subnet = subnet.into();
        let gateway = derive_gateway(&subnet)?;
        Ok(Self {
            name: name.into(),
            driver: driver.into(),
            subnet,
            gateway,
        })
    }

    /// Builds the network described by a generator config.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured subnet is malformed.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        Self::new(&config.network_name, &config.network_driver, &config.subnet)
    }
}

/// Replaces the last dotted group of `subnet` (mask included) with `1`.
///
/// This is purely textual: `10.0.5.0/24` yields `10.0.5.1`.
///
/// # Errors
///
/// Returns [`StackwireError::Config`] if `subnet` contains no `.`.
pub fn derive_gateway(subnet: &str) -> Result<String> {
    subnet
        .rsplit_once('.')
        .map(|(prefix, _)| format!("{prefix}.1"))
        .ok_or_else(|| StackwireError::Config {
            message: format!("subnet \"{subnet}\" is not a dotted address"),
        })
}

#[derive(Serialize)]
struct Pool<'a> {
    subnet: &'a str,
    gateway: &'a str,
}

#[derive(Serialize)]
struct Ipam<'a> {
    config: [Pool<'a>; 1],
}

#[derive(Serialize)]
struct Declaration<'a> {
    name: &'a str,
    driver: &'a str,
    ipam: Ipam<'a>,
}

/// Serializes as `{<name>: {name, driver, ipam: {config: [{subnet, gateway}]}}}`.
impl Serialize for NetworkSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            &self.name,
            &Declaration {
                name: &self.name,
                driver: &self.driver,
                ipam: Ipam {
                    config: [Pool {
                        subnet: &self.subnet,
                        gateway: &self.gateway,
                    }],
                },
            },
        )?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_replaces_last_group() {
        assert_eq!(derive_gateway("10.0.5.0/24").expect("gateway"), "10.0.5.1");
        assert_eq!(derive_gateway("172.20.0.0/16").expect("gateway"), "172.20.0.1");
    }

    #[test]
    fn gateway_requires_a_dot() {
        let err = derive_gateway("fd00::/64").unwrap_err();
        assert!(err.to_string().contains("fd00::/64"), "got: {err}");
    }

    #[test]
    fn default_config_network() {
        let network = NetworkSpec::from_config(&GeneratorConfig::default()).expect("network");
        assert_eq!(network.name, "cloud");
        assert_eq!(network.driver, "bridge");
        assert_eq!(network.gateway, "172.20.0.1");
    }

    #[test]
    fn serializes_as_compose_declaration() {
        let network = NetworkSpec::new("lan", "bridge", "10.0.5.0/24").expect("network");
        let value = serde_yaml::to_value(&network).expect("serialize");
        let lan = &value["lan"];
        assert_eq!(lan["name"].as_str(), Some("lan"));
        assert_eq!(lan["driver"].as_str(), Some("bridge"));
        let pool = &lan["ipam"]["config"][0];
        assert_eq!(pool["subnet"].as_str(), Some("10.0.5.0/24"));
        assert_eq!(pool["gateway"].as_str(), Some("10.0.5.1"));
    }
}
