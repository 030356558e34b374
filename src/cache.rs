//! Render cache.
//!
//! Whatever renders pages may keep its output here, keyed by an arbitrary
//! string (usually the page uri plus representation). The content tree
//! doesn't read the cache itself; it only flushes it wholesale after every
//! mutation, so a stale render can never outlive a change to the files.
//!
//! ## Storage
//!
//! [`FileCache`] keeps one JSON file per entry in its directory, named by
//! the SHA-256 of the key:
//!
//! ```text
//! .cache/
//! ├── 3f1c…e9.json   {"version":1,"key":"blog/first","value":"<html>…"}
//! └── a07b…12.json
//! ```
//!
//! Entries written by a different format version, or whose stored key
//! doesn't match (a hash collision), read as misses.

use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Bump to invalidate every existing entry when the format changes.
const ENTRY_VERSION: u32 = 1;

pub trait RenderCache {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
    /// Drop every entry.
    fn flush(&self) -> io::Result<()>;
}

/// Stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl RenderCache for NullCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> io::Result<()> {
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// In-process cache, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl RenderCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
struct Entry {
    version: u32,
    key: String,
    value: String,
}

/// One JSON file per entry under `root`.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", hash_key(key)))
    }
}

impl RenderCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        let raw = std::fs::read_to_string(self.entry_path(key)).ok()?;
        let entry: Entry = serde_json::from_str(&raw).ok()?;
        (entry.version == ENTRY_VERSION && entry.key == key).then_some(entry.value)
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let entry = Entry {
            version: ENTRY_VERSION,
            key: key.to_string(),
            value: value.to_string(),
        };
        let json = serde_json::to_string(&entry)?;
        std::fs::write(self.entry_path(key), json)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.entry_path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }

    /// Removes the entry files; other files in the directory are left alone.
    fn flush(&self) -> io::Result<()> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        tracing::debug!(root = %self.root.display(), removed, "render cache flushed");
        Ok(())
    }
}

fn hash_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn null_cache_never_hits() {
        let cache = NullCache;
        cache.set("a", "1").unwrap();
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn memory_cache_set_get_flush() {
        let cache = MemoryCache::new();
        cache.set("a", "1").unwrap();
        cache.set("b", "2").unwrap();
        assert_eq!(cache.get("a").as_deref(), Some("1"));
        cache.remove("a").unwrap();
        assert_eq!(cache.get("a"), None);
        cache.flush().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn file_cache_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().join("cache"));
        assert_eq!(cache.get("blog/first"), None);

        cache.set("blog/first", "<p>hi</p>").unwrap();
        assert_eq!(cache.get("blog/first").as_deref(), Some("<p>hi</p>"));
        assert_eq!(cache.get("blog/second"), None);
    }

    #[test]
    fn file_cache_flush_removes_entries_only() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        cache.set("a", "1").unwrap();
        cache.set("b", "2").unwrap();
        std::fs::write(tmp.path().join("keep.txt"), "x").unwrap();

        cache.flush().unwrap();
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
        assert!(tmp.path().join("keep.txt").exists());
    }

    #[test]
    fn flush_of_missing_directory_is_ok() {
        let tmp = TempDir::new().unwrap();
        FileCache::new(tmp.path().join("never")).flush().unwrap();
    }

    #[test]
    fn remove_missing_entry_is_ok() {
        let tmp = TempDir::new().unwrap();
        FileCache::new(tmp.path()).remove("nothing").unwrap();
    }

    #[test]
    fn wrong_version_reads_as_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        let stale = Entry {
            version: ENTRY_VERSION + 1,
            key: "a".into(),
            value: "old".into(),
        };
        std::fs::write(cache.entry_path("a"), serde_json::to_string(&stale).unwrap()).unwrap();
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn corrupt_entry_reads_as_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        std::fs::write(cache.entry_path("a"), "{not json").unwrap();
        assert_eq!(cache.get("a"), None);
    }
}
