//! File-backed key/value store for the durable cache tier.
//!
//! Layout: `{root}/{key}.json` plus a `{key}.meta.json` sidecar carrying a
//! blake3 content hash and the write timestamp.
//!
//! Features:
//! - Atomic replace (write to .tmp, rename into place)
//! - Integrity validation on read against the sidecar hash
//! - Quarantine for corrupt entries ({filename}.quarantined)

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use stockdash_core::store::{KvStore, StoreError};

/// Metadata sidecar for one stored entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    content_hash: String,
    written_at: NaiveDateTime,
}

/// Durable file store rooted at one directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(key)))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.meta.json", file_stem(key)))
    }

    fn quarantine(&self, key: &str, reason: &str) {
        let path = self.entry_path(key);
        let target = path.with_extension("json.quarantined");
        log::warn!(
            "quarantining corrupt store entry '{key}' ({reason}): {}",
            path.display()
        );
        let _ = fs::rename(&path, &target);
        let _ = fs::remove_file(self.meta_path(key));
    }
}

/// Keys may contain separators ("valid:watchlist", "active_job:all-stocks");
/// flatten them into safe file stems.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let content = fs::read_to_string(self.entry_path(key)).ok()?;

        // Validate against the sidecar when one exists; entries written by
        // hand (no sidecar) are accepted as-is.
        if let Ok(raw_meta) = fs::read_to_string(self.meta_path(key)) {
            match serde_json::from_str::<EntryMeta>(&raw_meta) {
                Ok(meta) => {
                    let hash = blake3::hash(content.as_bytes()).to_hex().to_string();
                    if hash != meta.content_hash {
                        self.quarantine(key, "content hash mismatch");
                        return None;
                    }
                }
                Err(_) => {
                    self.quarantine(key, "unreadable metadata sidecar");
                    return None;
                }
            }
        }

        Some(content)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StoreError::Io(format!("failed to create store dir: {e}")))?;

        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, value).map_err(|e| StoreError::Io(format!("write: {e}")))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io(format!("atomic rename failed: {e}"))
        })?;

        let meta = EntryMeta {
            content_hash: blake3::hash(value.as_bytes()).to_hex().to_string(),
            written_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(self.meta_path(key), meta_json)
            .map_err(|e| StoreError::Io(format!("meta write: {e}")))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        for path in [self.entry_path(key), self.meta_path(key)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io(format!("remove: {e}"))),
            }
        }
        Ok(())
    }
}
