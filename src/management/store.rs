use std::{
    collections::HashMap,
    io::Error,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use thiserror::Error;

use crate::config;

pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
pub const KEY_EXPIRES_AT: &str = "expires_at";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("preference file i/o failed: {0}")]
    Io(#[from] Error),
    #[error("preference file is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A process-wide durable key-value store.
///
/// Reads and writes only touch memory, so sign-out and sign-in checks never
/// wait on a runtime. [`PreferenceStore::flush`] makes the current entries
/// durable.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    async fn flush(&self) -> Result<(), StoreError>;
}

/// Preferences kept only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }

    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Preferences persisted as a single JSON object on disk.
///
/// A flush writes the whole object to a sibling temp file and renames it over
/// the old one, so the file on disk always holds one complete snapshot.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
    // flushes run one at a time so an older snapshot never lands last
    writing: tokio::sync::Mutex<()>,
}

impl FileStore {
    /// Loads the store from `path`. A missing file yields an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match async_fs::read_to_string(&path).await {
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            writing: tokio::sync::Mutex::new(()),
        })
    }

    /// Loads the store from its default location in the data directory.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(Self::default_path()).await
    }

    pub fn default_path() -> PathBuf {
        config::data_dir().join("preferences.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let _writing = self.writing.lock().await;
        let json = {
            let entries = self.entries();
            serde_json::to_string_pretty(&*entries)?
        };

        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        async_fs::write(&temp, json).await?;
        async_fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}
