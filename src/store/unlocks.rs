use anyhow::Result;
use std::collections::HashSet;
use tracing::info;

use super::KeyValueStore;

/// Store key holding the unlocked profile identifiers.
pub const UNLOCKED_KEY: &str = "unlocked_profiles";

/// Registry of profile identifiers unlocked by a successful voice-note
/// submission, layered on a [`KeyValueStore`].
pub struct UnlockRegistry<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> UnlockRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Mark `id` unlocked. Returns true if it was newly unlocked.
    pub fn unlock(&mut self, id: &str) -> Result<bool> {
        let mut unlocked = self.store.get_string_set(UNLOCKED_KEY);
        if !unlocked.insert(id.to_string()) {
            return Ok(false);
        }

        self.store.set_string_set(UNLOCKED_KEY, &unlocked)?;
        info!("Profile unlocked: {}", id);
        Ok(true)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.store.get_string_set(UNLOCKED_KEY).contains(id)
    }

    pub fn all(&self) -> HashSet<String> {
        self.store.get_string_set(UNLOCKED_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_unlock_and_query() {
        let mut registry = UnlockRegistry::new(MemoryStore::new());

        assert!(!registry.is_unlocked("ava"));
        assert!(registry.unlock("ava").unwrap());
        assert!(registry.is_unlocked("ava"));
    }

    #[test]
    fn test_unlock_twice_reports_already_present() {
        let mut registry = UnlockRegistry::new(MemoryStore::new());

        assert!(registry.unlock("kai").unwrap());
        assert!(!registry.unlock("kai").unwrap());
        assert_eq!(registry.all().len(), 1);
    }
}
