//! # Cardspace Sync Server
//!
//! Reference remote workspace store for Cardspace.
//!
//! This crate provides:
//! - Workspace endpoints (fetch, push)
//! - A per-owner document store with upsert semantics
//! - Authentication (HMAC-SHA256 owner tokens)
//!
//! # Architecture
//!
//! The server keeps exactly one document per owner. A push replaces the
//! owner's cards and update time and keeps the creation time. Merging is the
//! client's job; the server stores whatever it is given.
//!
//! # Authentication
//!
//! Authentication is optional but recommended for production:
//!
//! ```rust
//! use cardspace_sync_server::{AuthConfig, ServerConfig, TokenValidator};
//!
//! let secret = b"my-secure-secret-32-bytes-long!".to_vec();
//! let config = ServerConfig::default().with_auth(secret.clone());
//!
//! let validator = TokenValidator::new(AuthConfig::new(secret));
//! let token = validator.create_token(&"owner-1".into()).unwrap();
//! assert!(validator.validate_token(&token, &"owner-1".into()).is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod server;
mod store;

pub use auth::{AuthConfig, TokenValidator};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::SyncServer;
pub use store::DocumentStore;
