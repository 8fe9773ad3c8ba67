//! In-memory key-value store with an optional byte quota.
//!
//! The quota mirrors browser-style storage limits: a write that would push
//! the total size of keys and values past the limit fails with
//! [`StorageError::CapacityExceeded`] and leaves the store unchanged.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::backend::KeyValueStore;
use crate::error::{Result, StorageError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
    capacity_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `limit` bytes.
    pub fn with_capacity_bytes(limit: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            capacity_bytes: Some(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StorageError {
        StorageError::Backend("memory store lock poisoned".into())
    }
}

fn used_bytes(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        if let Some(limit) = self.capacity_bytes {
            let replaced = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = used_bytes(&entries) - replaced + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::CapacityExceeded { needed, limit });
            }
        }
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok(before - entries.len())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
