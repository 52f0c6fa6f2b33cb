#![cfg(test)]

use std::collections::HashSet;

use serde_json::json;
use tempfile::tempdir;

use super::common::all_backends;
use crate::storage::StoreKey;

fn key(segments: &[&str]) -> StoreKey {
    StoreKey::new(segments.iter().copied()).expect("valid test key")
}

// --- Test: Same behaviour through the trait object ---
#[test]
fn test_backends_share_contract() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    for mut backend in all_backends(temp_dir.path()) {
        let name = backend.name().to_string();
        let first = key(&["A/a", "B-b", "C"]);
        let second = key(&["suite", "run", "2024-01-01"]);

        assert!(backend.get(&first).unwrap_err().is_not_found(), "{name}");
        assert!(!backend.has_key(&first).expect("has_key"), "{name}");

        backend.set(&first, "one").expect("set first");
        backend.set_value(&second, &json!("two")).expect("set second");
        assert!(backend.set_value(&second, &json!(2)).is_err(), "{name}");

        assert_eq!(backend.get(&first).expect("get first"), "one", "{name}");
        assert_eq!(backend.get(&second).expect("get second"), "two", "{name}");

        let listed: HashSet<StoreKey> = backend.list_keys().expect("list").into_iter().collect();
        let expected: HashSet<StoreKey> = [first.clone(), second.clone()].into_iter().collect();
        assert_eq!(listed, expected, "{name}");

        // Wrong arity is a validation error on every backend
        let short = backend.get(&key(&["A"])).unwrap_err();
        assert!(short.is_validation(), "{name}: {short}");

        assert!(backend.remove_key(&first).expect("remove"), "{name}");
        assert!(!backend.has_key(&first).expect("has_key"), "{name}");
        assert_eq!(backend.list_keys().expect("list"), vec![second], "{name}");

        backend
            .verify_that_key_to_filepath_operation_is_reversible()
            .expect("template is reversible");
    }
}

// --- Test: Filesystem state outlives the backend instance ---
#[test]
fn test_filesystem_values_persist_across_instances() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let stored = key(&["x", "y/z", "w"]);

    {
        let mut backends = all_backends(temp_dir.path());
        for backend in backends.iter_mut() {
            backend.set(&stored, "kept").expect("set");
        }
    }

    for backend in all_backends(temp_dir.path()) {
        match backend.name() {
            "filesystem" => assert_eq!(backend.get(&stored).expect("get"), "kept"),
            _ => assert!(backend.get(&stored).unwrap_err().is_not_found()),
        }
    }
}
