//! # strata-id
//!
//! Identifier types for the strata topology bridge.
//!
//! ## Design Principles
//!
//! - Resource IDs are generated here and never reused within a process
//! - Names that come from the cluster inventory are validated, not generated
//! - Every identifier has one canonical string form with strict parsing
//!
//! ## Resource ID Format
//!
//! Resource IDs are UUIDs in hyphenated form, e.g.
//! `2f1b8e64-7a4d-4c6e-9d5b-0e3a1c7f9b22`. The coordinator gets a random one;
//! machines get one derived from their inventory identifier (see
//! [`ResourceId::from_external`]) so rediscovering a node always lands on the
//! same catalog key.

mod error;
mod generator;
mod macros;
mod types;

pub use error::IdError;
pub use generator::{IdentityGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use macros::MAX_NAME_LEN;
pub use types::*;

/// Re-export uuid for consumers that need raw UUID operations
pub use uuid::Uuid;
