//! JSON-file key-value store.
//!
//! The whole map is kept in memory and rewritten on every mutation through a
//! temporary sibling file plus rename, so a crash mid-write leaves either the
//! old or the new contents on disk. An unreadable file is treated as empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info, warn};

use crate::backend::KeyValueStore;
use crate::error::{Result, StorageError};

pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let entries = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Store file is corrupted, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        info!(path = %path.display(), keys = entries.len(), "Storage: file backend");
        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = entries.len(), "Store file written");
        Ok(())
    }

    fn poisoned() -> StorageError {
        StorageError::Backend("file store lock poisoned".into())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.persist(&entries) {
            // Roll back so memory never claims more than the disk holds.
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        let removed: Vec<(String, String)> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if removed.is_empty() {
            return Ok(0);
        }
        for (k, _) in &removed {
            entries.remove(k);
        }
        if let Err(e) = self.persist(&entries) {
            entries.extend(removed);
            return Err(e);
        }
        Ok(removed.len())
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
