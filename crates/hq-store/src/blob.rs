//! Key/value storage of JSON documents.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::{StoreError, StoreResult};

/// Opaque document storage; keys are short ASCII names.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// One `<key>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root_dir: PathBuf,
}

impl FsBlobStore {
    pub fn open(root_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let root_dir = root_dir.into();
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir).map_err(|e| StoreError::Unavailable {
                reason: format!("cannot create {}: {e}", root_dir.display()),
            })?;
        }
        if !root_dir.is_dir() {
            return Err(StoreError::Unavailable {
                reason: format!("{} is not a directory", root_dir.display()),
            });
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root_dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let bytes = match fs::read(self.blob_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        // Write beside the target and rename so readers never see a partial blob.
        let path = self.blob_path(key);
        let tmp = self.root_dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Parse the JSON blob under `key`.
///
/// A blob that is not text or not valid JSON for `T` is removed and reads as
/// absent, so one bad write never locks the store.
pub(crate) fn load_json_or_discard<T, S>(store: &S, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    S: BlobStore + ?Sized,
{
    let parsed = match store.get(key) {
        Ok(None) => return Ok(None),
        Ok(Some(content)) => serde_json::from_str(&content).map_err(|e| e.to_string()),
        Err(StoreError::Corrupt { reason, .. }) => Err(reason),
        Err(e) => return Err(e),
    };
    match parsed {
        Ok(value) => Ok(Some(value)),
        Err(reason) => {
            tracing::warn!(key, %reason, "discarding corrupt blob");
            store.remove(key)?;
            Ok(None)
        }
    }
}

/// In-process store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let blobs = self.blobs.lock().map_err(|_| StoreError::poisoned("blob"))?;
        Ok(blobs.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut blobs = self.blobs.lock().map_err(|_| StoreError::poisoned("blob"))?;
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut blobs = self.blobs.lock().map_err(|_| StoreError::poisoned("blob"))?;
        blobs.remove(key);
        Ok(())
    }
}
