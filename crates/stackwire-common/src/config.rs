//! Layered configuration for a generator run.
//!
//! Every key resolves as: environment variable (upper-cased key) >
//! config-file key (lower-cased) > built-in default from
//! [`crate::constants`]. An unset or empty value at one layer falls
//! through to the next.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::constants;
use crate::error::{Result, StackwireError};

/// Fully resolved settings for one generator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Directory scanned for container definition files.
    pub containers_folder: PathBuf,
    /// Directory that receives the per-file fragments. Recreated on every run.
    pub composes_folder: PathBuf,
    /// Name of the shared network.
    pub network_name: String,
    /// Driver of the shared network.
    pub network_driver: String,
    /// Subnet of the shared network in CIDR notation.
    pub subnet: String,
    /// Restart policy for definitions that do not set their own.
    pub restart_policy: String,
    /// Mount the whole service folder when a container has a single implicit bind.
    pub use_full_directory: bool,
    /// Host root for synthesized bind paths.
    pub bind_path: String,
    /// Path of the master manifest.
    pub output: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            containers_folder: PathBuf::from(constants::DEFAULT_CONTAINERS_FOLDER),
            composes_folder: PathBuf::from(constants::DEFAULT_COMPOSES_FOLDER),
            network_name: constants::DEFAULT_NETWORK_NAME.into(),
            network_driver: constants::DEFAULT_NETWORK_DRIVER.into(),
            subnet: constants::DEFAULT_SUBNET.into(),
            restart_policy: constants::DEFAULT_RESTART_POLICY.into(),
            use_full_directory: constants::DEFAULT_USE_FULL_DIRECTORY,
            bind_path: constants::DEFAULT_BIND_PATH.into(),
            output: PathBuf::from(constants::DEFAULT_OUTPUT),
        }
    }
}

impl GeneratorConfig {
    /// Loads the config file at `path` (if it exists) and layers the process
    /// environment over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a
    /// YAML mapping.
    pub fn load(path: &Path) -> Result<Self> {
        let file = ConfigFile::read(path)?;
        Ok(Self::layered(&file, |key| std::env::var(key).ok()))
    }

    /// Resolves every key from `env`, then `file`, then the defaults.
    ///
    /// `env` receives the upper-cased key name.
    pub fn layered<F>(file: &ConfigFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let lookup = |key: &str| {
            env(&key.to_uppercase())
                .filter(|value| !value.is_empty())
                .or_else(|| file.get(key))
        };
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);
        let path = |key: &str, default: PathBuf| lookup(key).map_or(default, PathBuf::from);

        Self {
            containers_folder: path("containers_folder", defaults.containers_folder),
            composes_folder: path("composes_folder", defaults.composes_folder),
            network_name: text("network_name", defaults.network_name),
            network_driver: text("network_driver", defaults.network_driver),
            subnet: text("subnet", defaults.subnet),
            restart_policy: text("restart_policy", defaults.restart_policy),
            use_full_directory: lookup("use_full_directory")
                .map_or(defaults.use_full_directory, |value| is_truthy(&value)),
            bind_path: text("bind_path", defaults.bind_path),
            output: path("output", defaults.output),
        }
    }
}

/// Returns `true` for `"true"` or `"1"`, ignoring case.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

/// Raw key/value pairs read from the generator config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    entries: Mapping,
}

impl ConfigFile {
    /// Reads `path`. A missing file yields an empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold a mapping.
    pub fn read(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(StackwireError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parses config file contents.
    ///
    /// # Errors
    ///
    /// Returns [`StackwireError::Config`] if `content` is not valid YAML or
    /// its root is not a mapping.
    pub fn parse(content: &str) -> Result<Self> {
        let root = serde_yaml::from_str::<Value>(content).map_err(|err| StackwireError::Config {
            message: format!("config file is not valid YAML: {err}"),
        })?;
        match root {
            Value::Null => Ok(Self::default()),
            Value::Mapping(entries) => Ok(Self { entries }),
            other => Err(StackwireError::Config {
                message: format!("config file root must be a mapping, got {other:?}"),
            }),
        }
    }

    /// Returns the value of the lower-cased `key` rendered as text.
    ///
    /// Null and empty-string values count as unset.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match self.entries.get(key.to_lowercase().as_str())? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let config = GeneratorConfig::layered(&ConfigFile::default(), env_of(&[]));
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.subnet, "172.20.0.0/24");
        assert!(config.use_full_directory);
    }

    #[test]
    fn file_overrides_default() {
        let file = ConfigFile::parse("network_name: lan\nbind_path: /srv\n").expect("parse");
        let config = GeneratorConfig::layered(&file, env_of(&[]));
        assert_eq!(config.network_name, "lan");
        assert_eq!(config.bind_path, "/srv");
        assert_eq!(config.network_driver, "bridge");
    }

    #[test]
    fn env_overrides_file() {
        let file = ConfigFile::parse("network_name: lan\n").expect("parse");
        let config = GeneratorConfig::layered(&file, env_of(&[("NETWORK_NAME", "wan")]));
        assert_eq!(config.network_name, "wan");
    }

    #[test]
    fn empty_env_falls_through_to_file() {
        let file = ConfigFile::parse("subnet: 10.0.0.0/16\n").expect("parse");
        let config = GeneratorConfig::layered(&file, env_of(&[("SUBNET", "")]));
        assert_eq!(config.subnet, "10.0.0.0/16");
    }

    #[test]
    fn use_full_directory_accepts_bool_and_strings() {
        let file = ConfigFile::parse("use_full_directory: false\n").expect("parse");
        assert!(!GeneratorConfig::layered(&file, env_of(&[])).use_full_directory);

        let config =
            GeneratorConfig::layered(&file, env_of(&[("USE_FULL_DIRECTORY", "1")]));
        assert!(config.use_full_directory);

        let config =
            GeneratorConfig::layered(&file, env_of(&[("USE_FULL_DIRECTORY", "yes")]));
        assert!(!config.use_full_directory);
    }

    #[test]
    fn truthy_is_case_insensitive() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("True"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        let err = ConfigFile::parse("- a\n- b\n").unwrap_err();
        assert!(err.to_string().contains("mapping"), "got: {err}");
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let err = ConfigFile::parse("subnet: [10.0.0.0/24\n").unwrap_err();
        assert!(
            matches!(err, StackwireError::Config { .. }),
            "got: {err:?}"
        );
        assert!(err.to_string().contains("not valid YAML"), "got: {err}");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = ConfigFile::read(&dir.path().join("absent.yaml")).expect("read");
        assert!(file.get("subnet").is_none());
    }
}
