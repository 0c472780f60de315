//! Anvil Core - Foundational types for anvil template tooling
//!
//! This crate provides the core types that all other anvil crates depend on:
//! - `NodeId`, `BehaviorId` - Stable identifiers for live tree entities
//! - `ContentHash` - SHA-256 based content hashing
//! - `Transform`, `Vec3` - Placement types
//! - Error types and Result alias

mod error;
mod hash;
mod id;
mod types;

pub use error::{AnvilError, Result};
pub use hash::ContentHash;
pub use id::{BehaviorId, NodeId};
pub use types::{Transform, Vec3};
