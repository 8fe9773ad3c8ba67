//! Key-value persistence for alert records.
//!
//! This crate provides:
//! - `KeyValueStore` trait for pluggable durable stores
//! - `MemoryStore` (optionally capacity-limited) and `FileStore` backends
//! - `StorageBackend` selecting a backend from `AlertConfig`

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;

pub use backend::{KeyValueStore, StorageBackend};
pub use error::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;
