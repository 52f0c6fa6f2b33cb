use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::tempdir;

use crate::error::{Error, Result};
use crate::storage::config::{
    ConfigFormat, FilesystemStoreBackendConfig, InMemoryStoreBackendConfig, StoreBackendConfig,
};
use crate::storage::error::StorageSystemError;
use crate::storage::key::StoreKey;

#[test]
fn test_format_from_path() {
    assert_eq!(ConfigFormat::from_path(Path::new("store.json")), Some(ConfigFormat::Json));
    assert_eq!(ConfigFormat::from_path(Path::new("STORE.JSON")), Some(ConfigFormat::Json));
    #[cfg(feature = "yaml-config")]
    {
        assert_eq!(ConfigFormat::from_path(Path::new("store.yaml")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("store.yml")), Some(ConfigFormat::Yaml));
    }
    #[cfg(feature = "toml-config")]
    assert_eq!(ConfigFormat::from_path(Path::new("store.toml")), Some(ConfigFormat::Toml));
    assert_eq!(ConfigFormat::from_path(Path::new("store.ini")), None);
    assert_eq!(ConfigFormat::from_path(Path::new("store")), None);

    assert_eq!(ConfigFormat::Json.extension(), "json");
}

#[test]
fn test_from_value_by_class_name() -> Result<()> {
    let config = StoreBackendConfig::from_value(&json!({
        "class_name": "InMemoryStoreBackend",
        "separator": ".",
    }))?;
    assert_eq!(
        config,
        StoreBackendConfig::InMemoryStoreBackend(InMemoryStoreBackendConfig::new().with_separator("."))
    );
    assert_eq!(config.class_name(), "InMemoryStoreBackend");

    let config = StoreBackendConfig::from_value(&json!({
        "class_name": "FilesystemStoreBackend",
        "base_directory": "expectations",
        "key_length": 3,
        "filepath_template": "{0}/{1}/{2}.{file_extension}",
        "file_extension": "json",
        "replaced_substring": "/",
        "replacement_string": "__",
    }))?;
    let expected = FilesystemStoreBackendConfig::new("expectations", 3, "{0}/{1}/{2}.{file_extension}")
        .with_file_extension("json")
        .with_escape("/", "__");
    assert_eq!(config, StoreBackendConfig::FilesystemStoreBackend(expected));
    Ok(())
}

#[test]
fn test_rejected_configs() {
    let cases = [
        json!(null),
        json!({"separator": "."}),
        json!({"class_name": "RedisStoreBackend"}),
        json!({"class_name": "InMemoryStoreBackend", "unexpected": true}),
        json!({"class_name": "FilesystemStoreBackend", "base_directory": "x"}),
        json!({
            "class_name": "FilesystemStoreBackend",
            "base_directory": "x",
            "key_length": "three",
            "filepath_template": "{0}",
        }),
    ];
    for case in cases {
        assert!(StoreBackendConfig::from_value(&case).is_err(), "accepted {case}");
    }

    match StoreBackendConfig::from_value(&json!(null)) {
        Err(Error::StorageSystem(StorageSystemError::InvalidConfig { .. })) => {}
        other => panic!("Expected InvalidConfig, got {:?}", other),
    }
}

#[cfg(feature = "toml-config")]
#[test]
fn test_parse_toml() -> Result<()> {
    let data = r#"
class_name = "FilesystemStoreBackend"
base_directory = "validations"
key_length = 2
filepath_template = "{0}/{1}.{file_extension}"
file_extension = "json"
"#;
    let config = StoreBackendConfig::parse(data, ConfigFormat::Toml)?;
    let expected = FilesystemStoreBackendConfig::new("validations", 2, "{0}/{1}.{file_extension}")
        .with_file_extension("json");
    assert_eq!(config, StoreBackendConfig::FilesystemStoreBackend(expected));
    Ok(())
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_parse_yaml() -> Result<()> {
    let data = "class_name: InMemoryStoreBackend\nkey_length: 1\n";
    let config = StoreBackendConfig::parse(data, ConfigFormat::Yaml)?;
    assert_eq!(
        config,
        StoreBackendConfig::InMemoryStoreBackend(InMemoryStoreBackendConfig::new().with_key_length(1))
    );
    Ok(())
}

#[test]
fn test_parse_json_errors_name_the_format() {
    match StoreBackendConfig::parse("{ not json", ConfigFormat::Json) {
        Err(Error::StorageSystem(StorageSystemError::DeserializationError { format, .. })) => {
            assert_eq!(format, "json");
        }
        other => panic!("Expected DeserializationError, got {:?}", other),
    }
}

#[test]
fn test_load_and_build() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let root_path = temp_dir.path().to_path_buf();
    let config_path = root_path.join("store.json");
    fs::write(
        &config_path,
        json!({
            "class_name": "FilesystemStoreBackend",
            "base_directory": "data",
            "key_length": 1,
            "filepath_template": "{0}.{file_extension}",
            "file_extension": "txt",
        })
        .to_string(),
    )
    .expect("Failed to write config");

    let config = StoreBackendConfig::load(&config_path)?;
    let mut backend = config.build(&root_path)?;
    assert_eq!(backend.name(), "filesystem");
    assert_eq!(backend.key_length(), Some(1));

    let key = StoreKey::new(["greeting"])?;
    backend.set(&key, "hello")?;
    assert!(root_path.join("data").join("greeting.txt").is_file());
    assert_eq!(backend.get(&key)?, "hello");
    backend.verify_that_key_to_filepath_operation_is_reversible()?;
    Ok(())
}

#[test]
fn test_load_unsupported_or_missing() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let ini = temp_dir.path().join("store.ini");
    fs::write(&ini, "x=1").expect("Failed to write config");
    assert!(matches!(
        StoreBackendConfig::load(&ini),
        Err(Error::StorageSystem(StorageSystemError::UnsupportedConfigFormat(_)))
    ));

    let missing: PathBuf = temp_dir.path().join("missing.json");
    assert!(matches!(
        StoreBackendConfig::load(&missing),
        Err(Error::StorageSystem(StorageSystemError::Io { .. }))
    ));
}

#[test]
fn test_build_in_memory() -> Result<()> {
    let config = StoreBackendConfig::InMemoryStoreBackend(InMemoryStoreBackendConfig::new());
    let mut backend = config.build(Path::new("."))?;
    assert_eq!(backend.name(), "in_memory");

    let key = StoreKey::new(["a", "b"])?;
    backend.set(&key, "v")?;
    assert_eq!(backend.list_keys()?, vec![key]);
    // Nothing to check for a backend without paths
    backend.verify_that_key_to_filepath_operation_is_reversible()
}
