//! Built-in defaults for every configuration key.

/// Directory scanned for container definition files.
pub const DEFAULT_CONTAINERS_FOLDER: &str = "containers";

/// Directory that receives one fragment per definition file.
pub const DEFAULT_COMPOSES_FOLDER: &str = "composes";

/// Name of the shared network every service joins.
pub const DEFAULT_NETWORK_NAME: &str = "cloud";

/// Driver of the shared network.
pub const DEFAULT_NETWORK_DRIVER: &str = "bridge";

/// Subnet of the shared network, in CIDR notation.
pub const DEFAULT_SUBNET: &str = "172.20.0.0/24";

/// Restart policy applied when a definition does not set one.
pub const DEFAULT_RESTART_POLICY: &str = "unless-stopped";

/// Whether a sole implicit bind mounts the whole service folder.
pub const DEFAULT_USE_FULL_DIRECTORY: bool = true;

/// Host directory under which implicit binds are rooted.
pub const DEFAULT_BIND_PATH: &str = "/home/docker/Docker";

/// Path of the master manifest.
pub const DEFAULT_OUTPUT: &str = "docker-compose.yaml";

/// Path of the optional generator config file.
pub const DEFAULT_CONFIG_FILE: &str = "config/generate.yaml";

/// File extensions recognised as container definitions.
pub const DEFINITION_EXTENSIONS: &[&str] = &["yaml", "yml"];
