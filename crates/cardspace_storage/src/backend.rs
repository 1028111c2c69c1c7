//! Blob store trait definition.

use crate::error::{StorageError, StorageResult};

/// Longest key accepted by [`validate_key`].
pub const MAX_KEY_LEN: usize = 128;

/// A local durable key/value store.
///
/// Stores are **opaque**. They keep whole blobs under string keys and know
/// nothing about cards or snapshots.
///
/// # Invariants
///
/// - `get` returns exactly the bytes of the last successful `put` for a key
/// - `put` replaces the previous blob atomically (readers never see a
///   partially written value)
/// - once `put` returns, the blob survives process termination for
///   durable implementations
/// - stores must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBlobStore`] - For testing
/// - [`super::FileBlobStore`] - For persistent storage
pub trait BlobStore: Send + Sync {
    /// Reads the blob stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing has been written under the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Writes `data` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    fn put(&mut self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Removes the blob under `key`.
    ///
    /// Returns `true` if a blob was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the removal fails.
    fn remove(&mut self, key: &str) -> StorageResult<bool>;

    /// Lists all keys currently holding a blob, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Forces previously written blobs (and their metadata) to durable media.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, data: &[u8]) -> StorageResult<()> {
        (**self).put(key, data)
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        (**self).remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }

    fn sync(&mut self) -> StorageResult<()> {
        (**self).sync()
    }
}

/// Checks that `key` is usable by every store.
///
/// Keys are non-empty, at most [`MAX_KEY_LEN`] bytes, and made of ASCII
/// letters, digits, `-`, `_` and `.`, and never start with `.`. This keeps
/// keys valid as file names on every platform.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] describing the first violation.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let reject = |reason| {
        Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason,
        })
    };

    if key.is_empty() {
        return reject("key is empty");
    }
    if key.len() > MAX_KEY_LEN {
        return reject("key is too long");
    }
    if key.starts_with('.') {
        return reject("key starts with '.'");
    }
    if !key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
    {
        return reject("key contains unsupported characters");
    }
    Ok(())
}
