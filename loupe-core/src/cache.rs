//! Content-addressed response cache.
//!
//! Identical analysis requests resolve to the same SHA-256 key, so a re-run
//! over the same transcripts never re-sends prompts to the LLM. Entries are
//! one JSON file per key with atomic writes (write to `.tmp`, then rename),
//! which keeps concurrent same-key writers safe and lets distinct keys
//! proceed without any shared lock. Retention is a bounded entry count with
//! oldest-by-mtime eviction.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed key -> JSON blob store keyed by content hash.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    max_entries: usize,
}

impl ResponseCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>, max_entries: usize) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, max_entries })
    }

    /// Hash a request payload into a cache key.
    pub fn hash(payload: &str) -> String {
        let digest = Sha256::digest(payload.as_bytes());
        format!("{digest:x}")
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Look up a cached blob. A corrupt entry is treated as a miss and
    /// removed.
    pub fn get(&self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);
        let data = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&data) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Dropping corrupt cache entry");
                let _ = std::fs::remove_file(&path);
                None
            }
        }
    }

    /// Store a blob under `key`, evicting oldest entries past the cap.
    pub fn insert(&self, key: &str, value: &Value) -> std::io::Result<()> {
        atomic_write(&self.entry_path(key), value)?;
        self.evict_past_cap();
        Ok(())
    }

    /// Number of entries currently on disk.
    pub fn len(&self) -> usize {
        self.entry_files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect()
    }

    fn evict_past_cap(&self) {
        let mut files: Vec<(PathBuf, std::time::SystemTime)> = self
            .entry_files()
            .into_iter()
            .filter_map(|p| {
                let mtime = std::fs::metadata(&p).and_then(|m| m.modified()).ok()?;
                Some((p, mtime))
            })
            .collect();
        if files.len() <= self.max_entries {
            return;
        }
        files.sort_by_key(|(_, mtime)| *mtime);
        let excess = files.len() - self.max_entries;
        for (path, _) in files.into_iter().take(excess) {
            debug!(path = %path.display(), "Evicting cache entry past cap");
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Atomically write JSON to `path` via a `.tmp` sibling and rename.
fn atomic_write(path: &Path, value: &Value) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(value).map_err(std::io::Error::other)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(dir.path(), 16).unwrap();

        let key = ResponseCache::hash("prompt payload");
        let value = json!({"insights": ["a", "b"]});
        cache.insert(&key, &value).unwrap();
        assert_eq!(cache.get(&key), Some(value));
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(dir.path(), 16).unwrap();
        assert!(cache.get(&ResponseCache::hash("never stored")).is_none());
    }

    #[test]
    fn test_hash_is_stable_and_distinct() {
        let a = ResponseCache::hash("payload a");
        assert_eq!(a, ResponseCache::hash("payload a"));
        assert_ne!(a, ResponseCache::hash("payload b"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(dir.path(), 16).unwrap();
        let key = ResponseCache::hash("x");
        std::fs::write(dir.path().join(format!("{key}.json")), "not json").unwrap();
        assert!(cache.get(&key).is_none());
        // The corrupt file is removed so a later insert starts clean.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(dir.path(), 2).unwrap();

        for i in 0..4 {
            let key = ResponseCache::hash(&format!("payload {i}"));
            cache.insert(&key, &json!({ "i": i })).unwrap();
            // mtime resolution on some filesystems is coarse
            std::thread::sleep(std::time::Duration::from_millis(20));
        }

        assert_eq!(cache.len(), 2);
        let newest = ResponseCache::hash("payload 3");
        assert_eq!(cache.get(&newest), Some(json!({"i": 3})));
        let oldest = ResponseCache::hash("payload 0");
        assert!(cache.get(&oldest).is_none());
    }

    #[test]
    fn test_no_tmp_leftover() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(dir.path(), 16).unwrap();
        let key = ResponseCache::hash("x");
        cache.insert(&key, &json!({"v": 1})).unwrap();
        let tmp = dir.path().join(format!("{key}.tmp"));
        assert!(!tmp.exists());
    }
}
