//! # Cardspace Storage
//!
//! Local durable storage for Cardspace workspaces.
//!
//! Blob stores are **opaque key/value stores** - they do not interpret the
//! bytes they hold. The replica store owns the snapshot format.
//!
//! ## Design Principles
//!
//! - One blob per key, replaced wholesale on every `put`
//! - No transactions beyond single-key overwrite
//! - Must be `Send + Sync` so a replica can be shared across threads
//!
//! ## Available Stores
//!
//! - [`InMemoryBlobStore`] - For testing and ephemeral sessions
//! - [`FileBlobStore`] - One file per key inside a directory
//!
//! ## Example
//!
//! ```rust
//! use cardspace_storage::{BlobStore, InMemoryBlobStore};
//!
//! let mut store = InMemoryBlobStore::new();
//! store.put("workspace-cards", b"[]").unwrap();
//! assert_eq!(store.get("workspace-cards").unwrap(), Some(b"[]".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{validate_key, BlobStore, MAX_KEY_LEN};
pub use error::{StorageError, StorageResult};
pub use file::FileBlobStore;
pub use memory::InMemoryBlobStore;
