//! # Tuplestore Storage System
//!
//! Key-value backends addressed by [`StoreKey`], an ordered tuple of strings.
//!
//! ```text
//!              StoreBackend (contract + key validation)
//!                 ▲                         ▲
//!                 │                         │
//!   InMemoryStoreBackend        FilesystemStoreBackend
//!   (HashMap<StoreKey, String>)        │ addresses files through
//!                                      ▼
//!                                  PathCodec
//!                     (template ⇄ relative path, reversibility check)
//! ```
//!
//! Backends are usually built from a declarative [`StoreBackendConfig`].

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod key;
pub mod memory;

/// Re-export key types
pub use backend::StoreBackend;
pub use codec::PathCodec;
pub use config::{
    ConfigFormat, FilesystemStoreBackendConfig, InMemoryStoreBackendConfig, StoreBackendConfig,
};
pub use error::StorageSystemError;
pub use filesystem::FilesystemStoreBackend;
pub use key::{StoreKey, validate_key_value};
pub use memory::InMemoryStoreBackend;

// Test module declaration
#[cfg(test)]
mod tests;
