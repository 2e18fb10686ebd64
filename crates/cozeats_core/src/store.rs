//! Durable key-value storage
//!
//! A string-to-string map that survives restarts. The session user, the
//! selected group and the theme preference each live under a well-known key.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{CoreError, Result};

/// Well-known storage keys
pub mod keys {
    /// Serialized session user record
    pub const USER: &str = "@cozeats_user";
    /// Identifier of the currently selected group
    pub const SELECTED_GROUP: &str = "@cozeats_selected_group";
    /// Theme preference (`light`, `dark` or `system`)
    pub const THEME: &str = "@cozeats_theme";
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

/// Process-local store, used in tests and for `--ephemeral` runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// JSON-file backed store
///
/// Every read goes to disk so values written by another process sharing the
/// file are observed. Writes replace the file atomically via a sibling temp
/// file and rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Default location under the user's data directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cozeats")
            .join("storage.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self, key: &str) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| CoreError::serialization("storage file", e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(CoreError::storage("read", key, e)),
        }
    }

    /// Like [`read_all`](Self::read_all), but an unparseable file is moved
    /// aside to `*.json.corrupt` and replaced by an empty map
    async fn read_for_write(&self, key: &str) -> Result<BTreeMap<String, String>> {
        match self.read_all(key).await {
            Err(CoreError::SerializationError { cause, .. }) => {
                let backup = self.path.with_extension("json.corrupt");
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    "storage file is unreadable, starting a new one: {}",
                    cause
                );
                if let Err(e) = tokio::fs::rename(&self.path, &backup).await {
                    warn!(path = %self.path.display(), "could not back up storage file: {}", e);
                }
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    async fn write_all(&self, key: &str, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::storage("write", key, e))?;
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| CoreError::serialization("storage file", e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| CoreError::storage("write", key, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CoreError::storage("write", key, e))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.read_all(key).await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_for_write(key).await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(key, &entries).await?;
        debug!(key, path = %self.path.display(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_for_write(key).await?;
        if entries.remove(key).is_some() {
            self.write_all(key, &entries).await?;
            debug!(key, path = %self.path.display(), "removed value");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic_ops() {
        let store = MemoryStore::new();
        assert_eq!(store.get(keys::USER).await.unwrap(), None);

        store.set(keys::USER, "{}").await.unwrap();
        assert_eq!(store.get(keys::USER).await.unwrap().as_deref(), Some("{}"));

        store.remove(keys::USER).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileStore::new(&path);
        store.set(keys::SELECTED_GROUP, "g1").await.unwrap();
        store.set(keys::THEME, "dark").await.unwrap();
        drop(store);

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get(keys::SELECTED_GROUP).await.unwrap().as_deref(),
            Some("g1")
        );

        reopened.remove(keys::SELECTED_GROUP).await.unwrap();
        assert_eq!(reopened.get(keys::SELECTED_GROUP).await.unwrap(), None);
        assert_eq!(reopened.get(keys::THEME).await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_file_store_sees_other_writers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let reader = FileStore::new(&path);
        let writer = FileStore::new(&path);
        assert_eq!(reader.get(keys::SELECTED_GROUP).await.unwrap(), None);

        writer.set(keys::SELECTED_GROUP, "g2").await.unwrap();
        assert_eq!(
            reader.get(keys::SELECTED_GROUP).await.unwrap().as_deref(),
            Some("g2")
        );
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        let err = store.get(keys::USER).await.unwrap_err();
        assert!(matches!(err, CoreError::SerializationError { .. }));
    }

    #[tokio::test]
    async fn test_file_store_write_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"@cozeats_selected_group": "#).unwrap();

        let store = FileStore::new(&path);
        store.remove(keys::SELECTED_GROUP).await.unwrap();
        assert_eq!(store.get(keys::SELECTED_GROUP).await.unwrap(), None);
        assert!(dir.path().join("storage.json.corrupt").exists());

        store.set(keys::THEME, "dark").await.unwrap();
        assert_eq!(store.get(keys::THEME).await.unwrap().as_deref(), Some("dark"));
    }
}
