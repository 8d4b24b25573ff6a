pub mod unlocks;

pub use unlocks::UnlockRegistry;

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flat string-set key-value store.
///
/// The only persistence this crate needs: sets of identifiers under
/// string keys. Implementations must persist `set_string_set`
/// durably enough that a reopened store sees the values.
pub trait KeyValueStore: Send + Sync {
    /// Values under `key`; empty set when the key is absent.
    fn get_string_set(&self, key: &str) -> HashSet<String>;

    fn set_string_set(&mut self, key: &str, values: &HashSet<String>) -> Result<()>;
}

/// Write-through JSON file store.
pub struct JsonFileStore {
    path: PathBuf,
    cache: HashMap<String, HashSet<String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading existing contents if the file
    /// is present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let cache = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse store file {}", path.display()))?
        } else {
            HashMap::new()
        };

        debug!("Opened store {} ({} keys)", path.display(), cache.len());

        Ok(Self { path, cache })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory {}", parent.display()))?;
        }

        let raw = serde_json::to_string_pretty(&self.cache)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write store file {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_string_set(&self, key: &str) -> HashSet<String> {
        self.cache.get(key).cloned().unwrap_or_default()
    }

    fn set_string_set(&mut self, key: &str, values: &HashSet<String>) -> Result<()> {
        self.cache.insert(key.to_string(), values.clone());
        self.flush()
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string_set(&self, key: &str) -> HashSet<String> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    fn set_string_set(&mut self, key: &str, values: &HashSet<String>) -> Result<()> {
        self.entries.insert(key.to_string(), values.clone());
        Ok(())
    }
}
