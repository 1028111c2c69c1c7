//! # Cardspace Testkit
//!
//! Test utilities for Cardspace.
//!
//! This crate provides:
//! - Replica fixtures over memory or a temporary directory
//! - Sample cards of every variant
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use cardspace_testkit::prelude::*;
//!
//! with_temp_replica(|replica| {
//!     let id = replica.create_card(CardVariant::Text, Position::new(0.0, 0.0)).unwrap();
//!     assert!(replica.card(&id).is_some());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use cardspace_core::{Card, CardBody, CardId, CardVariant, Position, ReplicaStore};
}

pub use fixtures::*;
pub use generators::*;
