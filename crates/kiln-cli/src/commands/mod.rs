//! CLI command implementations

pub mod asset;
pub mod import;
pub mod module;
pub mod profile;
