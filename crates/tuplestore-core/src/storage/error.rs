//! # Tuplestore Storage System Errors
//!
//! Defines error types specific to the storage backends.
//!
//! This module includes [`StorageSystemError`], the primary enum encompassing
//! the failures a backend can report: rejected keys and values, absent keys,
//! keys whose path encoding would be ambiguous, templates that cannot be
//! reversed, configuration problems and file I/O.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageSystemError {
    /// The key is not a sequence of non-empty strings.
    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },

    #[error("Key has {actual} segments but this backend expects {expected}")]
    KeyLengthMismatch { expected: usize, actual: usize },

    /// The value cannot be stored as text.
    #[error("Invalid value: {reason}")]
    InvalidValue { reason: String },

    #[error("Key not found: {key}{}", path.as_ref().map(|p| format!(" (expected at '{}')", p.display())).unwrap_or_default())]
    KeyNotFound { key: String, path: Option<PathBuf> },

    /// A segment already contains the escape sequence, so its encoded form
    /// could not be decoded unambiguously.
    #[error("Key segment '{segment}' contains the replacement string '{replacement}'")]
    AmbiguousKeySegment { segment: String, replacement: String },

    #[error("Key to filepath conversion is not reversible: {reason} (key {key}, recovered {})", recovered.as_deref().unwrap_or("<no match>"))]
    NotReversible {
        key: String,
        recovered: Option<String>,
        reason: String,
    },

    #[error("Invalid filepath template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid backend configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Unsupported configuration format: {0}")]
    UnsupportedConfigFormat(String),

    #[error("Deserialization from '{format}' failed: {source}")]
    DeserializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

// Helper for creating Io errors, ensuring path is always included.
impl StorageSystemError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        StorageSystemError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }

    pub fn invalid_key(reason: impl Into<String>) -> Self {
        StorageSystemError::InvalidKey {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        StorageSystemError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
