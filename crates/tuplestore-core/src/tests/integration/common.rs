use std::path::Path;

use serde_json::json;

use crate::storage::{StoreBackend, StoreBackendConfig};

/// One of each backend, both expecting three-segment keys.
pub fn all_backends(root: &Path) -> Vec<Box<dyn StoreBackend>> {
    let configs = [
        json!({
            "class_name": "InMemoryStoreBackend",
            "separator": ".",
            "key_length": 3,
        }),
        json!({
            "class_name": "FilesystemStoreBackend",
            "base_directory": "expectations",
            "key_length": 3,
            "filepath_template": "{0}/{1}/{2}/foo-{2}-expectations.{file_extension}",
            "file_extension": "txt",
            "replaced_substring": "/",
            "replacement_string": "__",
        }),
    ];

    configs
        .iter()
        .map(|value| {
            StoreBackendConfig::from_value(value)
                .and_then(|config| config.build(root))
                .expect("Failed to build backend")
        })
        .collect()
}
