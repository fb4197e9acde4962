//! Unified error types for the stackwire workspace.
//!
//! Only [`StackwireError::Io`], [`StackwireError::Config`] and
//! [`StackwireError::OutputWriteFailure`] abort a run. The per-container and
//! per-volume variants are reported, logged, and skipped by the compiler.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackwireError {
    /// An input file or directory could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A container definition lacks a field the compiler cannot do without.
    #[error("container \"{container}\" is missing required field `{field}`")]
    MissingRequiredField {
        /// Resolved name of the offending container.
        container: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A volume entry does not match the `[host:]container[:mode][;name]` grammar.
    #[error("ambiguous volume spec \"{spec}\": {reason}")]
    AmbiguousVolumeSpec {
        /// The raw volume spec as authored.
        spec: String,
        /// Why the spec was rejected.
        reason: &'static str,
    },

    /// A fragment or the master manifest could not be written.
    #[error("failed to write {path}: {source}")]
    OutputWriteFailure {
        /// Destination that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// YAML encoding or decoding failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackwireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_message_names_container_and_field() {
        let err = StackwireError::MissingRequiredField {
            container: "web".into(),
            field: "image",
        };
        assert_eq!(
            err.to_string(),
            "container \"web\" is missing required field `image`"
        );
    }

    #[test]
    fn write_failure_names_the_path() {
        let err = StackwireError::OutputWriteFailure {
            path: PathBuf::from("/nope/out.yaml"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/nope/out.yaml"));
    }
}
