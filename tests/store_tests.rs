// Integration tests for the key-value store and the unlock registry

use std::collections::HashSet;

use anyhow::Result;
use tempfile::TempDir;
use voicenote::{JsonFileStore, KeyValueStore, UnlockRegistry};

#[test]
fn test_json_store_roundtrip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("store.json");

    let mut store = JsonFileStore::open(&path)?;
    assert!(store.get_string_set("unlocked_profiles").is_empty());

    let values: HashSet<String> = ["ava", "kai"].iter().map(|s| s.to_string()).collect();
    store.set_string_set("unlocked_profiles", &values)?;

    assert_eq!(store.get_string_set("unlocked_profiles"), values);
    Ok(())
}

#[test]
fn test_json_store_persists_across_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("store.json");

    {
        let mut store = JsonFileStore::open(&path)?;
        let values: HashSet<String> = std::iter::once("ava".to_string()).collect();
        store.set_string_set("unlocked_profiles", &values)?;
    }

    let reopened = JsonFileStore::open(&path)?;
    let values = reopened.get_string_set("unlocked_profiles");
    assert_eq!(values.len(), 1);
    assert!(values.contains("ava"));

    Ok(())
}

#[test]
fn test_json_store_keys_are_independent() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = JsonFileStore::open(dir.path().join("store.json"))?;

    let a: HashSet<String> = std::iter::once("one".to_string()).collect();
    let b: HashSet<String> = std::iter::once("two".to_string()).collect();
    store.set_string_set("a", &a)?;
    store.set_string_set("b", &b)?;

    assert_eq!(store.get_string_set("a"), a);
    assert_eq!(store.get_string_set("b"), b);

    Ok(())
}

#[test]
fn test_unlock_registry_persists_across_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("unlocks.json");

    {
        let mut registry = UnlockRegistry::new(JsonFileStore::open(&path)?);
        assert!(registry.unlock("ava")?);
        assert!(registry.unlock("kai")?);
        assert!(!registry.unlock("kai")?, "second unlock is already present");
    }

    let registry = UnlockRegistry::new(JsonFileStore::open(&path)?);
    assert!(registry.is_unlocked("ava"));
    assert!(registry.is_unlocked("kai"));
    assert!(!registry.is_unlocked("noor"));
    assert_eq!(registry.all().len(), 2);

    Ok(())
}
