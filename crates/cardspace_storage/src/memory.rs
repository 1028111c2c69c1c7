//! In-memory blob store for testing.

use crate::backend::{validate_key, BlobStore};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An in-memory blob store.
///
/// This store keeps all blobs in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Sessions that don't need persistence
///
/// Clones share the same underlying map. Handing a clone to a new replica
/// after dropping the old one is how tests simulate a process restart.
///
/// # Example
///
/// ```rust
/// use cardspace_storage::{BlobStore, InMemoryBlobStore};
///
/// let mut store = InMemoryBlobStore::new();
/// let reopened = store.clone();
/// store.put("k", b"v").unwrap();
/// assert_eq!(reopened.get("k").unwrap(), Some(b"v".to_vec()));
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryBlobStore {
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with a pre-existing blob.
    ///
    /// Useful for testing recovery from corrupt data.
    #[must_use]
    pub fn with_entry(key: &str, data: Vec<u8>) -> Self {
        let store = Self::new();
        store.entries.write().insert(key.to_string(), data);
        store
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no blobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&mut self, key: &str, data: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.entries.write().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.entries.write().remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn put_and_get() {
        let mut store = InMemoryBlobStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.put("a", b"hello").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn put_overwrites() {
        let mut store = InMemoryBlobStore::new();
        store.put("a", b"first").unwrap();
        store.put("a", b"second").unwrap();

        assert_eq!(store.get("a").unwrap(), Some(b"second".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let mut store = InMemoryBlobStore::new();
        store.put("a", b"x").unwrap();

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn clones_share_entries() {
        let mut store = InMemoryBlobStore::new();
        let other = store.clone();
        store.put("shared", b"1").unwrap();

        assert_eq!(other.get("shared").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn keys_are_sorted() {
        let mut store = InMemoryBlobStore::new();
        store.put("b", b"").unwrap();
        store.put("a", b"").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn invalid_key_rejected() {
        let mut store = InMemoryBlobStore::new();
        let result = store.put("no/slashes", b"x");
        assert!(matches!(result, Err(StorageError::InvalidKey { .. })));
    }
}
