use std::path::Path;

use tracing::info;

use spendwatch_core::AlertConfig;

use crate::error::Result;
use crate::file::FileStore;
use crate::memory::MemoryStore;

/// Durable string key-value store.
///
/// Implementations use interior mutability so a single store can be shared
/// behind `&self`; callers are expected to serialize writes per key.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value for `key`, `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value for `key`.
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove every key starting with `prefix`. Returns how many were removed.
    fn delete_prefix(&self, prefix: &str) -> Result<usize>;

    /// All keys starting with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Config-selected backend.
pub enum StorageBackend {
    Memory(MemoryStore),
    File(FileStore),
}

impl StorageBackend {
    /// File-backed when `store_path` is configured, in-memory otherwise.
    pub fn from_config(config: &AlertConfig) -> Result<Self> {
        match &config.store_path {
            Some(path) => Self::file(path),
            None => {
                info!("Storage: in-memory backend");
                Ok(StorageBackend::Memory(MemoryStore::new()))
            }
        }
    }

    pub fn file(path: &Path) -> Result<Self> {
        Ok(StorageBackend::File(FileStore::open(path)?))
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, StorageBackend::File(_))
    }

    fn inner(&self) -> &dyn KeyValueStore {
        match self {
            StorageBackend::Memory(s) => s as &dyn KeyValueStore,
            StorageBackend::File(s) => s as &dyn KeyValueStore,
        }
    }
}

impl KeyValueStore for StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner().get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.inner().set(key, value)
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        self.inner().delete_prefix(prefix)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner().keys_with_prefix(prefix)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        (**self).delete_prefix(prefix)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }
}
