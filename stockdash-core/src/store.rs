//! Key/value storage seam behind the cache tiers.
//!
//! The `KvStore` trait abstracts over where a tier lives (file-backed,
//! runtime-dir-backed, in-memory) so the cache logic and its tests never
//! touch the filesystem directly.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Structured error types for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("storage serialization error: {0}")]
    Serialization(String),
}

/// String-payload key/value store.
///
/// `get` treats unreadable or corrupt entries as absent — integrity handling
/// (quarantine, hash checks) is an implementation concern below this trait.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Backs the session tier in tests and serves as the
/// fallback when no runtime directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
