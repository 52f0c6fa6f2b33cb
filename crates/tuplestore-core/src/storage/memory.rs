use std::collections::HashMap;

use serde_json::Value;

use crate::error::Result;
use crate::storage::backend::StoreBackend;
use crate::storage::config::InMemoryStoreBackendConfig;
use crate::storage::error::StorageSystemError;
use crate::storage::key::StoreKey;

const DEFAULT_SEPARATOR: &str = ".";

/// Process-local backend holding values in a map
///
/// Nothing touches the disk; contents disappear with the instance.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreBackend {
    config: InMemoryStoreBackendConfig,
    store: HashMap<StoreKey, String>,
}

impl InMemoryStoreBackend {
    pub fn new(config: InMemoryStoreBackendConfig) -> Self {
        Self {
            config,
            store: HashMap::new(),
        }
    }

    /// Build from a dynamic configuration value. `null` is rejected.
    pub fn from_value(config: &Value) -> Result<Self> {
        Ok(Self::new(InMemoryStoreBackendConfig::from_value(config)?))
    }

    pub fn config(&self) -> &InMemoryStoreBackendConfig {
        &self.config
    }

    pub fn separator(&self) -> &str {
        self.config.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR)
    }

    /// The key's segments joined with the configured separator.
    pub fn scalar_key(&self, key: &StoreKey) -> String {
        key.join(self.separator())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl StoreBackend for InMemoryStoreBackend {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn key_length(&self) -> Option<usize> {
        self.config.key_length
    }

    fn get(&self, key: &StoreKey) -> Result<String> {
        self.validate_key(key)?;
        self.store.get(key).cloned().ok_or_else(|| {
            StorageSystemError::KeyNotFound {
                key: self.scalar_key(key),
                path: None,
            }
            .into()
        })
    }

    fn set(&mut self, key: &StoreKey, value: &str) -> Result<()> {
        self.validate_key(key)?;
        log::debug!("Storing {} bytes under '{}'", value.len(), self.scalar_key(key));
        self.store.insert(key.clone(), value.to_string());
        Ok(())
    }

    fn has_key(&self, key: &StoreKey) -> Result<bool> {
        self.validate_key(key)?;
        Ok(self.store.contains_key(key))
    }

    fn list_keys(&self) -> Result<Vec<StoreKey>> {
        Ok(self.store.keys().cloned().collect())
    }

    fn remove_key(&mut self, key: &StoreKey) -> Result<bool> {
        self.validate_key(key)?;
        let removed = self.store.remove(key).is_some();
        if removed {
            log::debug!("Removed '{}'", self.scalar_key(key));
        }
        Ok(removed)
    }
}
