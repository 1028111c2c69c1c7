//! CLI command implementations.

pub mod inspect;
pub mod transfer;
pub mod verify;

use cardspace_core::{Config, ReplicaStore};
use cardspace_storage::{BlobStore, FileBlobStore};
use std::path::Path;

/// Reads the raw workspace blob, if one exists.
pub(crate) fn read_blob(
    path: &Path,
    key: &str,
) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No workspace found at {}", path.display()).into());
    }
    let store = FileBlobStore::open(path)?;
    Ok(store.get(key)?)
}

/// Opens the replica stored under `key`.
pub(crate) fn open_replica(
    path: &Path,
    key: &str,
) -> Result<ReplicaStore, Box<dyn std::error::Error>> {
    let store = FileBlobStore::open(path)?;
    let config = Config::new().workspace_key(key);
    Ok(ReplicaStore::load(config, Box::new(store))?)
}
