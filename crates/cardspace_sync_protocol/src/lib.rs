//! # Cardspace Sync Protocol
//!
//! Remote document types, merge policy and CBOR codecs for Cardspace.
//!
//! This crate provides:
//! - [`RemoteDocument`], the per-owner document held by the remote store
//! - Protocol messages (Fetch, Push) and their CBOR encoding
//! - [`MergePolicy`] and [`merge_cards`], the id-level reconciliation of two
//!   card lists
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod document;
mod error;
mod merge;
mod messages;

pub use codec::{from_cbor, to_cbor};
pub use document::RemoteDocument;
pub use error::{ProtocolError, ProtocolResult};
pub use merge::{merge_cards, MergeOutcome, MergePolicy};
pub use messages::{
    ErrorBody, FetchRequest, FetchResponse, PushRequest, PushResponse, SyncMessage, FETCH_PATH,
    PUSH_PATH,
};
