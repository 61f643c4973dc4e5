//! In-process key-value store with an optional byte quota.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

/// Mutex-guarded map implementing [`KeyValueStore`].
///
/// The quota counts the bytes of every key and value held, mirroring how a
/// browser accounts for local storage.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryKeyValueStore {
    /// Create a store that rejects writes once `bytes` would be exceeded.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(bytes),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, KeyValueStoreError> {
        self.entries
            .lock()
            .map_err(|_| KeyValueStoreError::unavailable("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let mut entries = self.lock()?;
        if let Some(limit) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            if others + key.len() + value.len() > limit {
                return Err(KeyValueStoreError::quota_exceeded(key, limit));
            }
        }
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_read_as_none() {
        let store = MemoryKeyValueStore::default();
        assert_eq!(store.get("token").expect("read"), None);
        store.remove("token").expect("removing a missing key succeeds");
    }

    #[test]
    fn overwriting_a_key_only_counts_the_new_value() {
        let store = MemoryKeyValueStore::with_quota(12);
        store.set("user", "12345678").expect("fits");
        store.set("user", "87654321").expect("replacement fits");
        assert_eq!(store.get("user").expect("read").as_deref(), Some("87654321"));
    }

    #[test]
    fn writes_beyond_quota_are_rejected_and_leave_prior_value() {
        let store = MemoryKeyValueStore::with_quota(10);
        store.set("token", "abc").expect("fits");
        let error = store
            .set("token", "abcdefghijk")
            .expect_err("exceeds quota");
        assert_eq!(error, KeyValueStoreError::quota_exceeded("token", 10_usize));
        assert_eq!(store.get("token").expect("read").as_deref(), Some("abc"));
    }
}
