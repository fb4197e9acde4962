//! Container definitions as authored in the containers folder.
//!
//! A definition file is a YAML stream; each document describes one
//! container. Documents are decoded independently so that one malformed
//! container does not take its siblings down with it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use stackwire_common::constants::DEFINITION_EXTENSIONS;
use stackwire_common::error::{Result, StackwireError};

/// A pass-through field value that may be authored in several shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// An ordered list, e.g. `cap_add: [NET_ADMIN]`.
    Sequence(Vec<Value>),
    /// A key/value map, e.g. `environment: {TZ: UTC}`.
    Mapping(Mapping),
    /// Any single value, e.g. `user: "1000:1000"`.
    Scalar(Value),
}

impl FieldValue {
    /// Returns `true` when the value carries nothing worth emitting.
    ///
    /// Null, `false`, zero, the empty string, and empty collections are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Sequence(items) => items.is_empty(),
            Self::Mapping(map) => map.is_empty(),
            Self::Scalar(value) => is_empty_scalar(value),
        }
    }
}

fn is_empty_scalar(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_i64() == Some(0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Tagged(tagged) => is_empty_scalar(&tagged.value),
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Sequence(items) => Self::Sequence(items),
            Value::Mapping(map) => Self::Mapping(map),
            other => Self::Scalar(other),
        }
    }
}

/// Keeps a present key as `Some` even when its value is null.
fn present_key<'de, D>(deserializer: D) -> std::result::Result<Option<FieldValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| Some(FieldValue::from(value)))
}

/// Optional fields copied verbatim into the compiled service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PassThrough {
    /// Command override.
    #[serde(default)]
    pub command: Option<FieldValue>,
    /// Network mode (`host`, `container:<name>`, ...). Excludes network attachment.
    ///
    /// `Some` whenever the key is present, even with a null value.
    #[serde(default, deserialize_with = "present_key")]
    pub network_mode: Option<FieldValue>,
    /// User the process runs as.
    #[serde(default)]
    pub user: Option<FieldValue>,
    /// Entrypoint override.
    #[serde(default)]
    pub entrypoint: Option<FieldValue>,
    /// Capabilities to add.
    #[serde(default)]
    pub cap_add: Option<FieldValue>,
    /// Capabilities to drop.
    #[serde(default)]
    pub cap_drop: Option<FieldValue>,
    /// Kernel parameters.
    #[serde(default)]
    pub sysctls: Option<FieldValue>,
    /// Container labels.
    #[serde(default)]
    pub labels: Option<FieldValue>,
    /// Environment variables.
    #[serde(default)]
    pub environment: Option<FieldValue>,
    /// Service dependencies.
    #[serde(default)]
    pub depends_on: Option<FieldValue>,
    /// Healthcheck block.
    #[serde(default)]
    pub healthcheck: Option<FieldValue>,
    /// Port mappings.
    #[serde(default)]
    pub ports: Option<FieldValue>,
}

/// One decoded document, before the required fields are checked.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDefinition {
    /// Explicit service name.
    #[serde(default)]
    pub name: Option<String>,
    /// Bind folder under the bind root. Defaults to the service name.
    #[serde(default)]
    pub folder: Option<String>,
    /// Container image reference.
    #[serde(default)]
    pub image: Option<String>,
    /// Restart policy override.
    #[serde(default)]
    pub restart: Option<String>,
    /// Raw device specs.
    #[serde(default)]
    pub devices: Option<Vec<String>>,
    /// Raw volume specs.
    #[serde(default)]
    pub volumes: Option<Vec<String>>,
    /// Everything else that is copied through untouched.
    #[serde(flatten)]
    pub fields: PassThrough,
}

impl RawDefinition {
    /// Promotes the document to a [`ContainerDefinition`].
    ///
    /// `label` identifies the container in the error when `image` is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StackwireError::MissingRequiredField`] if `image` is absent
    /// or empty.
    pub fn into_definition(self, label: &str) -> Result<ContainerDefinition> {
        let image = self
            .image
            .filter(|image| !image.is_empty())
            .ok_or_else(|| StackwireError::MissingRequiredField {
                container: self.name.clone().unwrap_or_else(|| label.to_string()),
                field: "image",
            })?;

        Ok(ContainerDefinition {
            name: self.name,
            folder: self.folder,
            image,
            restart: self.restart,
            devices: self.devices.unwrap_or_default(),
            volumes: self.volumes.unwrap_or_default(),
            fields: self.fields,
        })
    }
}

/// A container definition that carries every required field.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerDefinition {
    /// Explicit service name, if any.
    pub name: Option<String>,
    /// Explicit bind folder, if any.
    pub folder: Option<String>,
    /// Container image reference.
    pub image: String,
    /// Restart policy override.
    pub restart: Option<String>,
    /// Raw device specs, in declared order.
    pub devices: Vec<String>,
    /// Raw volume specs, in declared order.
    pub volumes: Vec<String>,
    /// Pass-through fields.
    pub fields: PassThrough,
}

#[cfg(test)]
impl ContainerDefinition {
    /// Creates a definition with only an image set.
    pub(crate) fn new(image: impl Into<String>) -> Self {
        Self {
            name: None,
            folder: None,
            image: image.into(),
            restart: None,
            devices: Vec::new(),
            volumes: Vec::new(),
            fields: PassThrough::default(),
        }
    }
}

/// A definition file and its decoded documents.
#[derive(Debug)]
pub struct SourceFile {
    /// Path the file was read from.
    pub path: PathBuf,
    /// Decoded documents in stream order. Empty documents are dropped.
    pub documents: Vec<Result<RawDefinition>>,
}

impl SourceFile {
    /// Decodes every document of a YAML stream.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let mut documents = Vec::new();
        let mut last_error: Option<String> = None;
        for document in serde_yaml::Deserializer::from_str(content) {
            match Option::<RawDefinition>::deserialize(document) {
                Ok(Some(definition)) => documents.push(Ok(definition)),
                Ok(None) => {}
                Err(source) => {
                    // A syntax error ends the stream but the deserializer keeps
                    // yielding it.
                    let message = source.to_string();
                    if last_error.as_deref() == Some(message.as_str()) {
                        break;
                    }
                    last_error = Some(message);
                    documents.push(Err(StackwireError::Yaml { source }));
                }
            }
        }
        Self {
            path: path.into(),
            documents,
        }
    }

    /// Reads and decodes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| StackwireError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(path, &content))
    }

    /// File name without its extension; the default service name.
    #[must_use]
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name with its extension; the fragment is written under this name.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Lists definition files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns an error if `dir` cannot be read.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| StackwireError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_definition = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| DEFINITION_EXTENSIONS.contains(&ext));
        if is_definition && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Discovers and reads every definition file in `dir`, in sorted order.
///
/// # Errors
///
/// Returns an error if the directory or any file in it cannot be read.
pub fn load_dir(dir: &Path) -> Result<Vec<SourceFile>> {
    tracing::info!(path = %dir.display(), "loading container definitions");
    discover(dir)?
        .iter()
        .map(|path| SourceFile::read(path))
        .collect()
}
