//! Durable key-value storage for cache snapshots.
//!
//! The contract mirrors a browser's localStorage: string keys, string
//! values, three operations. Persistence is best-effort - every caller
//! in the cache logs and swallows storage failures, so a broken backend
//! degrades the cache to always-miss-on-restart and nothing else.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Generic durable key-value interface.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-memory backend for tests and for running with persistence
/// effectively disabled.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().expect("storage mutex poisoned");
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock().expect("storage mutex poisoned");
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock().expect("storage mutex poisoned");
        items.remove(key);
        Ok(())
    }
}

/// On-disk backend: one JSON file per key under a directory.
pub struct FileStorage {
    dir: PathBuf,
}

/// Application name used for the default storage directory
const APP_NAME: &str = "hirecache";

impl FileStorage {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Backend rooted at the platform cache directory,
    /// e.g. `~/.cache/hirecache` on Linux.
    pub fn default_location() -> Result<Self> {
        let cache_dir =
            dirs::cache_dir().ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Self::new(cache_dir.join(APP_NAME))
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage item: {}", key))?;
        Ok(Some(contents))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        std::fs::write(self.item_path(key), value)
            .with_context(|| format!("Failed to write storage item: {}", key))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.item_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage item: {}", key))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.get_item("k").unwrap().is_none());
        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));
        storage.remove_item("k").unwrap();
        assert!(storage.get_item("k").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!(
            "hirecache-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let storage = FileStorage::new(dir.clone()).unwrap();
        storage.set_item("snapshot", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.get_item("snapshot").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        storage.remove_item("snapshot").unwrap();
        assert!(storage.get_item("snapshot").unwrap().is_none());
        // Removing a missing key is fine.
        storage.remove_item("snapshot").unwrap();
        let _ = std::fs::remove_dir_all(dir);
    }
}
