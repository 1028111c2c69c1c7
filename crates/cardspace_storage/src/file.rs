//! File-based blob store for persistent storage.

use crate::backend::{validate_key, BlobStore};
use crate::error::{StorageError, StorageResult};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const BLOB_EXTENSION: &str = "blob";
const TEMP_EXTENSION: &str = "blob.tmp";

/// A directory-backed blob store.
///
/// Each key maps to `<dir>/<key>.blob`. Data survives process restarts.
///
/// # Durability
///
/// `put` writes the new blob to a temporary sibling file, flushes it,
/// optionally calls `File::sync_all()`, then renames it over the previous
/// blob. A crash mid-write leaves either the old or the new blob, never a
/// torn one.
///
/// # Example
///
/// ```no_run
/// use cardspace_storage::{BlobStore, FileBlobStore};
/// use std::path::Path;
///
/// let mut store = FileBlobStore::open(Path::new("workspace")).unwrap();
/// store.put("workspace-cards", b"[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBlobStore {
    dir: PathBuf,
    sync_on_put: bool,
}

impl FileBlobStore {
    /// Opens a blob store rooted at `dir`, creating the directory if needed.
    ///
    /// Every `put` is synced to disk before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, or if `dir`
    /// exists but is not a directory.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        if !dir.is_dir() {
            return Err(StorageError::Corrupted(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            sync_on_put: true,
        })
    }

    /// Sets whether `put` calls `sync_all` before renaming into place.
    #[must_use]
    pub fn with_sync_on_put(mut self, sync_on_put: bool) -> Self {
        self.sync_on_put = sync_on_put;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path backing `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid.
    pub fn blob_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{BLOB_EXTENSION}")))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{TEMP_EXTENSION}"))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.blob_path(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.blob_path(key)?;
        let temp = self.temp_path(key);

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp)?;
            file.write_all(data)?;
            file.flush()?;
            if self.sync_on_put {
                file.sync_all()?;
            }
        }

        fs::rename(&temp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        let path = self.blob_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let suffix = format!(".{BLOB_EXTENSION}");
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(key) = name.strip_suffix(&suffix) {
                if validate_key(key).is_ok() {
                    keys.push(key.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn sync(&mut self) -> StorageResult<()> {
        // Directory handles can be synced on Unix; elsewhere renames are
        // already durable once the file itself was synced.
        #[cfg(unix)]
        {
            fs::File::open(&self.dir)?.sync_all()?;
        }
        Ok(())
    }
}
