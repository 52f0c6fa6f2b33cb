use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::storage::backend::StoreBackend;
use crate::storage::codec::PathCodec;
use crate::storage::config::FilesystemStoreBackendConfig;
use crate::storage::error::StorageSystemError;
use crate::storage::key::StoreKey;
use crate::utils::{create_dir_all, find_files, relative_slash_path};

/// Filesystem backend storing each value as one file
///
/// Keys are turned into paths under the base directory by a [`PathCodec`].
/// Nothing is cached, so every call observes the current state of the disk.
#[derive(Clone)]
pub struct FilesystemStoreBackend {
    root_directory: PathBuf,
    base_directory: PathBuf,
    config: FilesystemStoreBackendConfig,
    codec: PathCodec,
}

impl FilesystemStoreBackend {
    /// Open a backend rooted at `root_directory`.
    ///
    /// A relative `base_directory` is resolved against `root_directory` and
    /// created if missing. The template is compiled here, so template errors
    /// surface at construction.
    pub fn new(root_directory: impl Into<PathBuf>, config: FilesystemStoreBackendConfig) -> Result<Self> {
        let root_directory = root_directory.into();
        let base_directory = if config.base_directory.is_absolute() {
            config.base_directory.clone()
        } else {
            root_directory.join(&config.base_directory)
        };

        let mut codec = PathCodec::new(
            &config.filepath_template,
            config.key_length,
            config.file_extension.as_deref(),
        )?;
        if let Some((replaced, replacement)) = config.escape()? {
            codec = codec.with_escape(replaced, replacement);
        }

        create_dir_all(&base_directory)
            .map_err(|e| Error::io(e, "create_base_directory", base_directory.clone()))?;
        log::info!(
            "Opened filesystem store at {} with template '{}'",
            base_directory.display(),
            config.filepath_template
        );

        Ok(Self {
            root_directory,
            base_directory,
            config,
            codec,
        })
    }

    /// Build from a dynamic configuration value. `null` is rejected.
    pub fn from_value(root_directory: impl Into<PathBuf>, config: &Value) -> Result<Self> {
        Self::new(root_directory, FilesystemStoreBackendConfig::from_value(config)?)
    }

    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Directory every template path is resolved under
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn config(&self) -> &FilesystemStoreBackendConfig {
        &self.config
    }

    pub fn codec(&self) -> &PathCodec {
        &self.codec
    }

    /// Relative path (with `/` separators) a key is stored at.
    pub fn convert_key_to_filepath(&self, key: &StoreKey) -> Result<String> {
        self.validate_key(key)?;
        self.codec.encode(key)
    }

    /// Key stored at a relative path, if the path belongs to this store.
    pub fn convert_filepath_to_key(&self, filepath: &str) -> Option<StoreKey> {
        self.codec.decode(filepath)
    }

    fn resolve_path(&self, key: &StoreKey) -> Result<PathBuf> {
        let relative = self.convert_key_to_filepath(key)?;
        Ok(self.base_directory.join(relative))
    }

    // Write through a temporary file in the target directory, then persist
    // it over the target.
    fn write_file(&self, full_path: &Path, contents: &[u8]) -> Result<()> {
        let parent = full_path.parent().ok_or_else(|| {
            Error::from(StorageSystemError::invalid_config(format!(
                "path '{}' has no parent directory",
                full_path.display()
            )))
        })?;
        if !parent.is_dir() {
            create_dir_all(parent).map_err(|e| Error::io(e, "create_dir_all", parent.to_path_buf()))?;
        }

        let mut temp_file = NamedTempFile::new_in(parent)
            .map_err(|e| Error::io(e, "create_temp_file", parent.to_path_buf()))?;
        temp_file
            .write_all(contents)
            .map_err(|e| Error::io(e, "write_to_temp_file", temp_file.path().to_path_buf()))?;
        temp_file
            .persist(full_path)
            .map_err(|e| Error::io(e.error, "persist_temp_file", full_path.to_path_buf()))?;
        Ok(())
    }
}

impl StoreBackend for FilesystemStoreBackend {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn key_length(&self) -> Option<usize> {
        Some(self.config.key_length)
    }

    fn get(&self, key: &StoreKey) -> Result<String> {
        let full_path = self.resolve_path(key)?;
        if !full_path.is_file() {
            return Err(StorageSystemError::KeyNotFound {
                key: key.to_string(),
                path: Some(full_path),
            }
            .into());
        }
        log::debug!("Reading {}", full_path.display());
        fs::read_to_string(&full_path).map_err(|e| Error::io(e, "read_to_string", full_path))
    }

    fn set(&mut self, key: &StoreKey, value: &str) -> Result<()> {
        let full_path = self.resolve_path(key)?;
        log::debug!("Writing {} bytes to {}", value.len(), full_path.display());
        self.write_file(&full_path, value.as_bytes())
    }

    fn has_key(&self, key: &StoreKey) -> Result<bool> {
        Ok(self.resolve_path(key)?.is_file())
    }

    fn list_keys(&self) -> Result<Vec<StoreKey>> {
        let files = find_files(&self.base_directory, &|_: &Path| true)
            .map_err(|e| Error::io(e, "list_keys", self.base_directory.clone()))?;

        let mut keys = Vec::with_capacity(files.len());
        for file in &files {
            let decoded = relative_slash_path(&self.base_directory, file)
                .and_then(|relative| self.codec.decode(&relative));
            match decoded {
                Some(key) => keys.push(key),
                None => log::trace!("Skipping {}, not part of this store", file.display()),
            }
        }
        log::debug!(
            "Listed {} keys from {} files under {}",
            keys.len(),
            files.len(),
            self.base_directory.display()
        );
        Ok(keys)
    }

    fn remove_key(&mut self, key: &StoreKey) -> Result<bool> {
        let full_path = self.resolve_path(key)?;
        if !full_path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&full_path).map_err(|e| Error::io(e, "remove_file", full_path.clone()))?;
        log::debug!("Removed {}", full_path.display());
        Ok(true)
    }

    fn verify_that_key_to_filepath_operation_is_reversible(&self) -> Result<()> {
        match self.codec.verify_that_key_to_filepath_operation_is_reversible() {
            Ok(()) => {
                log::info!("Template '{}' is reversible", self.codec.template());
                Ok(())
            }
            Err(e) => {
                log::warn!("Template '{}' failed verification: {}", self.codec.template(), e);
                Err(e)
            }
        }
    }
}

impl fmt::Debug for FilesystemStoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilesystemStoreBackend")
            .field("base_directory", &self.base_directory)
            .field("filepath_template", &self.config.filepath_template)
            .field("key_length", &self.config.key_length)
            .finish()
    }
}
