//! Two-tier list cache: durable snapshots, session-scoped validity.
//!
//! The snapshot tier survives app restarts; the validity tier lives only for
//! the current session. A snapshot whose validity flag is absent or false
//! may still be rendered (stale-while-revalidate) but must not be trusted as
//! authoritative — the consumer refreshes it in the background and calls
//! `write` then `mark_valid` on success.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{KvStore, StoreError};

const VALID_PREFIX: &str = "valid:";

/// Two-tier cache over injected storage backends.
pub struct CacheStore {
    durable: Box<dyn KvStore>,
    session: Box<dyn KvStore>,
}

impl CacheStore {
    pub fn new(durable: Box<dyn KvStore>, session: Box<dyn KvStore>) -> Self {
        Self { durable, session }
    }

    /// The durable snapshot for `key`, regardless of validity.
    ///
    /// A snapshot that no longer decodes is treated as absent.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.durable.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("cache snapshot '{key}' failed to decode: {e}");
                None
            }
        }
    }

    /// Session-scoped validity flag; false if never set or the session ended.
    pub fn is_valid(&self, key: &str) -> bool {
        self.session
            .get(&format!("{VALID_PREFIX}{key}"))
            .as_deref()
            == Some("true")
    }

    /// Replace the durable snapshot. All-or-nothing: a failed write leaves
    /// the previous snapshot in place (the file tier renames atomically).
    pub fn write<T: Serialize>(&self, key: &str, snapshot: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.durable.put(key, &raw)
    }

    /// Flag the snapshot as authoritative for the rest of the session.
    pub fn mark_valid(&self, key: &str) -> Result<(), StoreError> {
        self.session.put(&format!("{VALID_PREFIX}{key}"), "true")
    }

    /// Clear the validity flag; the snapshot itself is untouched.
    ///
    /// Called before any mutating request that makes the snapshot
    /// known-stale, so a concurrent reader cannot observe a
    /// valid-but-soon-wrong state.
    pub fn invalidate(&self, key: &str) -> Result<(), StoreError> {
        self.session.remove(&format!("{VALID_PREFIX}{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn memory_cache() -> CacheStore {
        CacheStore::new(Box::new(MemoryStore::new()), Box::new(MemoryStore::new()))
    }

    #[test]
    fn snapshot_survives_invalidation() {
        let cache = memory_cache();
        let rows = vec!["TCS.NS".to_string(), "INFY.NS".to_string()];

        cache.write("watchlist", &rows).unwrap();
        cache.mark_valid("watchlist").unwrap();
        assert!(cache.is_valid("watchlist"));

        cache.invalidate("watchlist").unwrap();
        assert!(!cache.is_valid("watchlist"));
        // Stale-while-revalidate: the snapshot is still readable.
        assert_eq!(cache.read::<Vec<String>>("watchlist").unwrap(), rows);
    }

    #[test]
    fn validity_is_false_when_never_set() {
        let cache = memory_cache();
        cache.write("all_stocks", &vec![1, 2, 3]).unwrap();
        assert!(!cache.is_valid("all_stocks"));
    }

    #[test]
    fn write_replaces_wholesale() {
        let cache = memory_cache();
        cache.write("watchlist", &vec!["A".to_string()]).unwrap();
        cache
            .write("watchlist", &vec!["B".to_string(), "C".to_string()])
            .unwrap();
        assert_eq!(
            cache.read::<Vec<String>>("watchlist").unwrap(),
            vec!["B".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn corrupt_snapshot_reads_as_absent() {
        let durable = MemoryStore::new();
        durable.put("watchlist", "not valid json {{{").unwrap();
        let cache = CacheStore::new(Box::new(durable), Box::new(MemoryStore::new()));
        assert!(cache.read::<Vec<String>>("watchlist").is_none());
    }

    #[test]
    fn validity_flags_are_per_key() {
        let cache = memory_cache();
        cache.mark_valid("watchlist").unwrap();
        assert!(cache.is_valid("watchlist"));
        assert!(!cache.is_valid("all_stocks"));
    }
}
