//! Core DataStore implementations

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::{BLOB_EXTENSION, StoreError};

/// A keyed store of JSON documents
///
/// Implementations must be safe to share between threads; the journal holds
/// its store behind an `Arc<dyn DataStore>`.
pub trait DataStore: Send + Sync {
    /// Read the document stored under `key`, if any
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the document stored under `key`
    fn write(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Remove the document stored under `key`, returning whether it existed
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// List stored keys in sorted order
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Typed helpers on top of [`DataStore`]
pub trait DataStoreExt: DataStore {
    /// Read and deserialize the document stored under `key`
    fn read_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.read(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Json {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Serialize and store `value` under `key`
    fn write_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })?;
        self.write(key, &value)
    }
}

impl<S: DataStore + ?Sized> DataStoreExt for S {}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// File-backed store: one `{key}.json` per key under a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        debug!(?root, "FileStore::open: opened data store");
        Ok(Self { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, BLOB_EXTENSION))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{}.lock", key))
    }

    fn open_lock(&self, key: &str) -> Result<File, StoreError> {
        let path = self.lock_path(key);
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io(path, e))
    }
}

impl DataStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        let path = self.blob_path(key);
        if !path.exists() {
            debug!(%key, "FileStore::read: no blob");
            return Ok(None);
        }

        let lock = self.open_lock(key)?;
        FileExt::lock_shared(&lock).map_err(|e| StoreError::io(self.lock_path(key), e))?;
        let content = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e));
        FileExt::unlock(&lock).map_err(|e| StoreError::io(self.lock_path(key), e))?;

        let value = serde_json::from_str(&content?).map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })?;
        debug!(%key, "FileStore::read: loaded blob");
        Ok(Some(value))
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(key)?;
        let path = self.blob_path(key);
        let tmp_path = path.with_extension(format!("{}.tmp", BLOB_EXTENSION));

        let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })?;

        let lock = self.open_lock(key)?;
        FileExt::lock_exclusive(&lock).map_err(|e| StoreError::io(self.lock_path(key), e))?;

        let result = (|| {
            let mut tmp = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
            tmp.write_all(content.as_bytes())
                .map_err(|e| StoreError::io(&tmp_path, e))?;
            tmp.sync_all().map_err(|e| StoreError::io(&tmp_path, e))?;
            fs::rename(&tmp_path, &path).map_err(|e| StoreError::io(&path, e))
        })();

        FileExt::unlock(&lock).map_err(|e| StoreError::io(self.lock_path(key), e))?;
        result?;

        info!(%key, bytes = content.len(), "FileStore::write: saved blob");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        let path = self.blob_path(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        let _ = fs::remove_file(self.lock_path(key));
        debug!(%key, "FileStore::remove: removed blob");
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && validate_key(stem).is_ok()
            {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-memory store, mostly for tests and for hosts that persist elsewhere
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        Ok(self.blobs.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(key)?;
        self.blobs.write().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.blobs.write().remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.blobs.read().keys().cloned().collect())
    }
}
