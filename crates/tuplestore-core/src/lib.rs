pub mod error;
pub mod storage;
pub mod utils;

// Re-export key public types/traits for easier use by the binary
pub use error::{Error, Result};
pub use storage::{
    FilesystemStoreBackend, InMemoryStoreBackend, PathCodec, StorageSystemError, StoreBackend,
    StoreBackendConfig, StoreKey,
};

#[cfg(test)]
mod tests;
