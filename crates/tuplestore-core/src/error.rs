//! # Tuplestore Core Errors
//!
//! Defines the crate-level [`Error`] every public operation returns.
//!
//! Subsystem errors (currently only [`StorageSystemError`]) are wrapped so
//! callers can match on the typed variant, while [`Error::Other`] carries
//! free-form failures raised outside the storage layer.
use std::path::PathBuf;
use std::result::Result as StdResult;

use crate::storage::error::StorageSystemError;
use thiserror::Error as ThisError;

/// Custom error type for tuplestore
#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed storage system error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Helper to create an I/O error with context.
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::StorageSystem(StorageSystemError::io(source, operation, path))
    }

    /// Borrow the storage error, if this is one.
    pub fn storage(&self) -> Option<&StorageSystemError> {
        match self {
            Error::StorageSystem(e) => Some(e),
            Error::Other(_) => None,
        }
    }

    /// True when a lookup failed because the key has never been stored.
    pub fn is_not_found(&self) -> bool {
        matches!(self.storage(), Some(StorageSystemError::KeyNotFound { .. }))
    }

    /// True for rejected keys or values, raised before any I/O happens.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.storage(),
            Some(
                StorageSystemError::InvalidKey { .. }
                    | StorageSystemError::KeyLengthMismatch { .. }
                    | StorageSystemError::InvalidValue { .. }
            )
        )
    }
}
