//! Remote gateway abstraction.

use crate::error::{SyncError, SyncResult};
use cardspace_core::{OwnerId, WorkspaceSnapshot};
use cardspace_sync_protocol::RemoteDocument;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// What a fetch found for an owner.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteFetch {
    /// The owner's document.
    Found(RemoteDocument),
    /// The owner has no document yet.
    NotFound,
}

impl RemoteFetch {
    /// Returns the document if one was found.
    pub fn document(&self) -> Option<&RemoteDocument> {
        match self {
            RemoteFetch::Found(doc) => Some(doc),
            RemoteFetch::NotFound => None,
        }
    }
}

/// Adapter over the remote document store.
///
/// The store holds one document per owner. `push_remote` is an upsert: it
/// creates the document on first write and replaces it afterwards.
/// Implementations report unreachable stores as
/// [`SyncError::Transport`]; a missing document is not an error.
pub trait RemoteGateway: Send + Sync {
    /// Fetches the owner's document.
    fn fetch_remote(&self, owner: &OwnerId) -> SyncResult<RemoteFetch>;

    /// Writes the owner's document.
    fn push_remote(&self, owner: &OwnerId, snapshot: &WorkspaceSnapshot) -> SyncResult<()>;
}

impl<G: RemoteGateway + ?Sized> RemoteGateway for Arc<G> {
    fn fetch_remote(&self, owner: &OwnerId) -> SyncResult<RemoteFetch> {
        (**self).fetch_remote(owner)
    }

    fn push_remote(&self, owner: &OwnerId, snapshot: &WorkspaceSnapshot) -> SyncResult<()> {
        (**self).push_remote(owner, snapshot)
    }
}

/// An in-process remote store for testing.
///
/// Can be switched offline to simulate transport failures.
#[derive(Debug)]
pub struct MemoryGateway {
    documents: RwLock<HashMap<OwnerId, RemoteDocument>>,
    online: AtomicBool,
    fetches: AtomicU64,
    pushes: AtomicU64,
}

impl MemoryGateway {
    /// Creates an empty, online gateway.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            fetches: AtomicU64::new(0),
            pushes: AtomicU64::new(0),
        }
    }

    /// Sets whether requests reach the store.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Stores a document directly, bypassing the counters.
    pub fn insert_document(&self, document: RemoteDocument) {
        self.documents
            .write()
            .insert(document.owner_id.clone(), document);
    }

    /// Returns a copy of the owner's document.
    pub fn document(&self, owner: &OwnerId) -> Option<RemoteDocument> {
        self.documents.read().get(owner).cloned()
    }

    /// Number of fetches that reached the store.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of pushes that reached the store.
    pub fn push_count(&self) -> u64 {
        self.pushes.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> SyncResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::transport_retryable("remote store unreachable"))
        }
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteGateway for MemoryGateway {
    fn fetch_remote(&self, owner: &OwnerId) -> SyncResult<RemoteFetch> {
        self.check_online()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(match self.documents.read().get(owner) {
            Some(doc) => RemoteFetch::Found(doc.clone()),
            None => RemoteFetch::NotFound,
        })
    }

    fn push_remote(&self, owner: &OwnerId, snapshot: &WorkspaceSnapshot) -> SyncResult<()> {
        self.check_online()?;
        self.pushes.fetch_add(1, Ordering::SeqCst);

        let mut documents = self.documents.write();
        match documents.get_mut(owner) {
            Some(doc) => {
                doc.cards_data.clone_from(&snapshot.cards);
                doc.updated_at = snapshot.updated_at;
            }
            None => {
                documents.insert(
                    owner.clone(),
                    RemoteDocument::new(owner.clone(), snapshot.cards.clone(), snapshot.updated_at),
                );
            }
        }
        Ok(())
    }
}
