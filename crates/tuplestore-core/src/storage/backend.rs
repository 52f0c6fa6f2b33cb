use std::fmt::Debug;

use serde_json::Value;

use crate::error::Result;
use crate::storage::error::StorageSystemError;
use crate::storage::key::{StoreKey, value_kind};

/// Contract every key-value backend satisfies.
///
/// Keys are validated before anything else happens, so a rejected key never
/// causes I/O. Values are plain text.
pub trait StoreBackend: Send + Sync + Debug {
    /// Get the name of this backend
    fn name(&self) -> &str;

    /// Arity every key must have, if this backend fixes one
    fn key_length(&self) -> Option<usize>;

    /// Check a key against this backend's arity.
    fn validate_key(&self, key: &StoreKey) -> Result<()> {
        match self.key_length() {
            Some(expected) if key.len() != expected => Err(StorageSystemError::KeyLengthMismatch {
                expected,
                actual: key.len(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Read the value stored under `key`.
    ///
    /// Fails with [`StorageSystemError::KeyNotFound`] if the key was never set.
    fn get(&self, key: &StoreKey) -> Result<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &StoreKey, value: &str) -> Result<()>;

    /// Store a dynamically typed value, which must be a string.
    fn set_value(&mut self, key: &StoreKey, value: &Value) -> Result<()> {
        match value {
            Value::String(text) => self.set(key, text),
            other => Err(StorageSystemError::InvalidValue {
                reason: format!("expected a string, got {}", value_kind(other)),
            }
            .into()),
        }
    }

    /// Check whether a value is stored under exactly this key
    fn has_key(&self, key: &StoreKey) -> Result<bool>;

    /// List every stored key. Order is unspecified.
    fn list_keys(&self) -> Result<Vec<StoreKey>>;

    /// Remove the value under `key`, returning whether one existed
    fn remove_key(&mut self, key: &StoreKey) -> Result<bool>;

    /// Prove that keys survive the trip to their storage address and back.
    ///
    /// Backends that store keys as-is have nothing to check.
    fn verify_that_key_to_filepath_operation_is_reversible(&self) -> Result<()> {
        Ok(())
    }
}
