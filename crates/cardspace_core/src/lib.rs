//! # Cardspace Core
//!
//! Card model and local replica store for Cardspace.
//!
//! This crate provides:
//! - The card entity model (a closed set of variants, each with its own payload)
//! - Commands issued by the input layer and their pure transformations
//! - [`ReplicaStore`], the write-through local replica
//! - The JSON snapshot format shared by local storage and the remote store
//!
//! ## Key Invariants
//!
//! - A card's id is its only merge key and is never reused
//! - A card's variant never changes after creation
//! - Commands on absent ids are no-ops, never errors
//! - Every applied command is persisted before `apply` returns

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod card;
mod command;
mod config;
mod error;
mod replica;
mod snapshot;
mod types;

pub use card::{
    Card, CardBody, CardId, CardVariant, Comment, KanbanColumn, KanbanTask, MediaFile, Point,
    Position, Size, Stroke, StrokeKind, TodoItem, IFRAME_MIN_SIZE,
};
pub use command::{apply_command, Command};
pub use config::{Config, DEFAULT_WORKSPACE_KEY};
pub use error::{CoreError, CoreResult};
pub use replica::{ReplicaSnapshot, ReplicaStore};
pub use snapshot::{decode_cards, encode_cards, WorkspaceSnapshot};
pub use types::OwnerId;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
