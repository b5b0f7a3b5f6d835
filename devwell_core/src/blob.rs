//! Key-value blob storage.
//!
//! The persistence layer only needs "bytes under a stable key". The file
//! backend keeps one file per key with the same locking and atomic-rename
//! discipline used for every other durable write.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Durable key-value store for encoded blobs
pub trait BlobStore: Send + Sync {
    /// Read the blob under `key`; `None` when nothing was stored
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the blob under `key`
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete the blob under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!("invalid blob key {:?}", key)))
    }
}

/// Blob store keeping each key in `<dir>/<key>.json`
#[derive(Clone, Debug)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!("Opened blob store at {:?}", dir);
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a key is stored at
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = Vec::new();
        let read = std::io::BufReader::new(&file).read_to_end(&mut contents);
        let _ = file.unlock();
        read?;

        tracing::debug!("Read {} bytes from {:?}", contents.len(), path);
        Ok(Some(contents))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Temp file in the same directory so the rename stays on one filesystem
        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process blob store, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Keys currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.blobs().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        self.blobs().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.blobs().remove(key);
        Ok(())
    }
}
