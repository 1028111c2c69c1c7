//! Per-owner document storage.

use crate::auth::to_hex;
use crate::error::ServerResult;
use cardspace_core::{Card, OwnerId};
use cardspace_storage::BlobStore;
use cardspace_sync_protocol::RemoteDocument;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "doc-";

/// The server's document store: one document per owner.
///
/// Documents live in memory and, when opened over a [`BlobStore`], are
/// written through to it as JSON under a key derived from the owner id.
pub struct DocumentStore {
    documents: RwLock<HashMap<OwnerId, RemoteDocument>>,
    backend: Option<Mutex<Box<dyn BlobStore>>>,
}

impl DocumentStore {
    /// Creates an empty, memory-only store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            backend: None,
        }
    }

    /// Opens a store over `backend`, loading every stored document.
    ///
    /// Entries that fail to decode are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn open(backend: Box<dyn BlobStore>) -> ServerResult<Self> {
        let mut documents = HashMap::new();
        for key in backend.keys()? {
            if !key.starts_with(KEY_PREFIX) {
                continue;
            }
            let Some(bytes) = backend.get(&key)? else {
                continue;
            };
            match serde_json::from_slice::<RemoteDocument>(&bytes) {
                Ok(doc) => {
                    documents.insert(doc.owner_id.clone(), doc);
                }
                Err(e) => warn!(%key, error = %e, "skipping unreadable document"),
            }
        }
        debug!(documents = documents.len(), "opened document store");

        Ok(Self {
            documents: RwLock::new(documents),
            backend: Some(Mutex::new(backend)),
        })
    }

    /// Returns a copy of the owner's document.
    pub fn get(&self, owner: &OwnerId) -> Option<RemoteDocument> {
        self.documents.read().get(owner).cloned()
    }

    /// Creates or replaces the owner's document.
    ///
    /// A replaced document keeps its `created_at`. Returns the stored
    /// document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails; the previous document is
    /// then kept.
    pub fn upsert(
        &self,
        owner: &OwnerId,
        cards: Vec<Card>,
        updated_at: DateTime<Utc>,
    ) -> ServerResult<RemoteDocument> {
        let mut documents = self.documents.write();
        let document = match documents.get(owner) {
            Some(existing) => RemoteDocument {
                owner_id: owner.clone(),
                cards_data: cards,
                created_at: existing.created_at,
                updated_at,
            },
            None => RemoteDocument::new(owner.clone(), cards, updated_at),
        };

        if let Some(backend) = &self.backend {
            let bytes = serde_json::to_vec(&document)?;
            let mut backend = backend.lock();
            backend.put(&storage_key(owner), &bytes)?;
            backend.sync()?;
        }

        documents.insert(owner.clone(), document.clone());
        Ok(document)
    }

    /// Removes the owner's document. Returns true if one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    pub fn remove(&self, owner: &OwnerId) -> ServerResult<bool> {
        let mut documents = self.documents.write();
        if let Some(backend) = &self.backend {
            backend.lock().remove(&storage_key(owner))?;
        }
        Ok(documents.remove(owner).is_some())
    }

    /// Returns the number of documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true if there are no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage keys are hashed so that any owner id maps to a valid key.
fn storage_key(owner: &OwnerId) -> String {
    let digest = Sha256::digest(owner.as_str().as_bytes());
    format!("{KEY_PREFIX}{}", to_hex(&digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardspace_core::{CardVariant, Position};
    use cardspace_storage::{validate_key, FileBlobStore, InMemoryBlobStore};
    use chrono::Duration;
    use tempfile::tempdir;

    fn cards(ids: &[&str]) -> Vec<Card> {
        ids.iter()
            .map(|id| Card::new((*id).into(), CardVariant::Text, Position::default()))
            .collect()
    }

    #[test]
    fn upsert_keeps_created_at() {
        let store = DocumentStore::new();
        let owner = OwnerId::from("o");
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let t1 = t0 + Duration::minutes(1);

        store.upsert(&owner, cards(&["a"]), t0).unwrap();
        let doc = store.upsert(&owner, cards(&["a", "b"]), t1).unwrap();

        assert_eq!(doc.created_at, t0);
        assert_eq!(doc.updated_at, t1);
        assert_eq!(store.get(&owner).unwrap().cards_data.len(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn owners_are_isolated() {
        let store = DocumentStore::new();
        store.upsert(&"a".into(), cards(&["x"]), Utc::now()).unwrap();
        assert!(store.get(&"b".into()).is_none());
        assert!(store.remove(&"a".into()).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn storage_keys_are_valid_for_any_owner() {
        for owner in ["", "first.last@example.com", "../../etc", "ünïcödé"] {
            let key = storage_key(&owner.into());
            validate_key(&key).unwrap();
            assert_eq!(key.len(), KEY_PREFIX.len() + 64);
        }
    }

    #[test]
    fn documents_survive_reopen() {
        let dir = tempdir().unwrap();
        let owner = OwnerId::from("user@example.com");
        {
            let backend = FileBlobStore::open(dir.path()).unwrap();
            let store = DocumentStore::open(Box::new(backend)).unwrap();
            store.upsert(&owner, cards(&["a", "b"]), Utc::now()).unwrap();
        }

        let backend = FileBlobStore::open(dir.path()).unwrap();
        let store = DocumentStore::open(Box::new(backend)).unwrap();
        assert_eq!(store.get(&owner).unwrap().cards_data, cards(&["a", "b"]));
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let backend = InMemoryBlobStore::with_entry("doc-broken", b"not json".to_vec());
        let store = DocumentStore::open(Box::new(backend)).unwrap();
        assert!(store.is_empty());
    }
}
