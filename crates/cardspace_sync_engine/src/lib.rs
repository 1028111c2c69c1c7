//! # Cardspace Sync Engine
//!
//! Reconciliation engine and sync scheduler for Cardspace.
//!
//! This crate provides:
//! - [`RemoteGateway`], the adapter over the remote document store, with an
//!   in-memory implementation and an HTTP implementation
//! - [`SyncEngine`], which merges the local replica with the remote document
//!   and tracks sync status
//! - [`SyncScheduler`], which decides when reconciliation runs and keeps at
//!   most one attempt in flight
//!
//! ## Architecture
//!
//! Local commands never wait for sync. A reconciliation:
//! 1. Snapshots the replica
//! 2. Fetches the owner's remote document
//! 3. Merges by card id under the trigger's policy
//! 4. Pushes the result if the remote document differs from it
//! 5. Writes the result back through the replica store
//!
//! ## Key Invariants
//!
//! - A failed attempt never touches the replica
//! - A missing remote document is created from the local replica
//! - Any local command after a successful sync makes the status `Unsynced`
//! - Concurrent triggers are dropped, not queued

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod engine;
mod error;
mod gateway;
mod http;
mod scheduler;
mod workspace;

pub use cardspace_sync_protocol::MergePolicy;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SyncConfig, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SYNC_INTERVAL};
pub use engine::{ReconcileOutcome, SyncEngine, SyncStats, SyncStatus};
pub use error::{SyncError, SyncResult};
pub use gateway::{MemoryGateway, RemoteFetch, RemoteGateway};
pub use http::{HttpClient, HttpGateway, LoopbackClient, LoopbackServer};
pub use scheduler::{SyncScheduler, SyncTrigger, TriggerOutcome};
pub use workspace::Workspace;
