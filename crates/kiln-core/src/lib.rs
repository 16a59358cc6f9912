//! Kiln Core - Foundational types for the Kiln import pipeline
//!
//! This crate provides the types every other Kiln crate depends on:
//! - `ItemId` - Arena handles for import tree nodes
//! - `ContentHash` - SHA-256 based content hashing
//! - Error types and Result alias

mod error;
mod hash;
mod id;

pub use error::{KilnError, Result};
pub use hash::ContentHash;
pub use id::ItemId;
