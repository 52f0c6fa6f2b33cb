use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
#[cfg(feature = "yaml-config")]
use serde_yaml;
#[cfg(feature = "toml-config")]
use toml;

use crate::error::Result;
use crate::storage::StoreBackend;
use crate::storage::error::StorageSystemError;
use crate::storage::filesystem::FilesystemStoreBackend;
use crate::storage::memory::InMemoryStoreBackend;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Options recognised by [`InMemoryStoreBackend`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InMemoryStoreBackendConfig {
    /// Joins key segments when a single scalar form is needed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    /// Arity every key must have; any arity is accepted when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_length: Option<usize>,
}

impl InMemoryStoreBackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn with_key_length(mut self, key_length: usize) -> Self {
        self.key_length = Some(key_length);
        self
    }

    /// Read the options from a dynamic value. `null` is rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        from_config_value(value)
    }
}

/// Options recognised by [`FilesystemStoreBackend`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesystemStoreBackendConfig {
    /// Directory holding the store, absolute or relative to the root directory
    pub base_directory: PathBuf,
    /// Arity every key must have
    pub key_length: usize,
    /// Path template with `{0}`..`{n-1}` and `{file_extension}` placeholders
    pub filepath_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    /// Text escaped inside key segments, typically a path separator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_substring: Option<String>,
    /// Escape sequence written in place of `replaced_substring`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_string: Option<String>,
}

impl FilesystemStoreBackendConfig {
    pub fn new(
        base_directory: impl Into<PathBuf>,
        key_length: usize,
        filepath_template: impl Into<String>,
    ) -> Self {
        Self {
            base_directory: base_directory.into(),
            key_length,
            filepath_template: filepath_template.into(),
            file_extension: None,
            replaced_substring: None,
            replacement_string: None,
        }
    }

    pub fn with_file_extension(mut self, file_extension: impl Into<String>) -> Self {
        self.file_extension = Some(file_extension.into());
        self
    }

    /// Escape `replaced` as `replacement` inside key segments.
    pub fn with_escape(mut self, replaced: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.replaced_substring = Some(replaced.into());
        self.replacement_string = Some(replacement.into());
        self
    }

    /// Read the options from a dynamic value. `null` is rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        from_config_value(value)
    }

    /// The escape pair, if one is configured.
    ///
    /// Both halves must be given together, non-empty, and the escape
    /// sequence must not reintroduce the text it replaces.
    pub fn escape(&self) -> Result<Option<(&str, &str)>> {
        match (self.replaced_substring.as_deref(), self.replacement_string.as_deref()) {
            (None, None) => Ok(None),
            (Some(replaced), Some(replacement)) => {
                if replaced.is_empty() || replacement.is_empty() {
                    return Err(StorageSystemError::invalid_config(
                        "replaced_substring and replacement_string must not be empty",
                    )
                    .into());
                }
                if replacement.contains(replaced) {
                    return Err(StorageSystemError::invalid_config(format!(
                        "replacement_string {replacement:?} contains replaced_substring {replaced:?}"
                    ))
                    .into());
                }
                Ok(Some((replaced, replacement)))
            }
            _ => Err(StorageSystemError::invalid_config(
                "replaced_substring and replacement_string must be given together",
            )
            .into()),
        }
    }
}

/// Declarative description of a backend, tagged by `class_name`.
///
/// ```toml
/// class_name = "FilesystemStoreBackend"
/// base_directory = "expectations"
/// key_length = 1
/// filepath_template = "{0}.{file_extension}"
/// file_extension = "json"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name")]
pub enum StoreBackendConfig {
    InMemoryStoreBackend(InMemoryStoreBackendConfig),
    FilesystemStoreBackend(FilesystemStoreBackendConfig),
}

impl StoreBackendConfig {
    /// Read a backend description from a dynamic value. `null` is rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        from_config_value(value)
    }

    /// Parse a backend description in the given format.
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => {
                let value: Value = serde_json::from_str(data)
                    .map_err(|e| deserialization_error("json", e))?;
                Self::from_value(&value)
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                serde_yaml::from_str(data).map_err(|e| deserialization_error("yaml", e).into())
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::from_str(data).map_err(|e| deserialization_error("toml", e).into())
            }
        }
    }

    /// Load a backend description from a file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            StorageSystemError::UnsupportedConfigFormat(path.display().to_string())
        })?;
        let content = fs::read_to_string(path)
            .map_err(|e| StorageSystemError::io(e, "read_config", path.to_path_buf()))?;
        log::debug!("Loaded backend configuration from {}", path.display());
        Self::parse(&content, format)
    }

    /// Name of the backend class this configuration builds.
    pub fn class_name(&self) -> &'static str {
        match self {
            StoreBackendConfig::InMemoryStoreBackend(_) => "InMemoryStoreBackend",
            StoreBackendConfig::FilesystemStoreBackend(_) => "FilesystemStoreBackend",
        }
    }

    /// Construct the described backend.
    ///
    /// `root_directory` anchors relative filesystem base directories.
    pub fn build(&self, root_directory: &Path) -> Result<Box<dyn StoreBackend>> {
        match self {
            StoreBackendConfig::InMemoryStoreBackend(config) => {
                Ok(Box::new(InMemoryStoreBackend::new(config.clone())))
            }
            StoreBackendConfig::FilesystemStoreBackend(config) => Ok(Box::new(
                FilesystemStoreBackend::new(root_directory, config.clone())?,
            )),
        }
    }
}

fn from_config_value<T: DeserializeOwned>(value: &Value) -> Result<T> {
    if value.is_null() {
        return Err(StorageSystemError::invalid_config("a configuration is required, got null").into());
    }
    serde_json::from_value(value.clone()).map_err(|e| deserialization_error("json", e).into())
}

fn deserialization_error(
    format: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> StorageSystemError {
    StorageSystemError::DeserializationError {
        format: format.to_string(),
        source: Box::new(source),
    }
}
