//! Error types for Kiln

use crate::id::ItemId;
use thiserror::Error;

/// The main error type for Kiln operations
#[derive(Debug, Error)]
pub enum KilnError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),

    #[error("Asset error: {0}")]
    AssetError(String),

    #[error("Import error: {0}")]
    ImportError(String),

    #[error("Malformed model '{0}': no meshes and no animations")]
    MalformedModel(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Import item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Cycle detected: {0}")]
    CycleDetected(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Profile error: {0}")]
    ProfileError(String),

    #[error("Commit blocked: {0}")]
    CommitBlocked(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

/// Result type alias for Kiln operations
pub type Result<T> = std::result::Result<T, KilnError>;

impl From<toml::de::Error> for KilnError {
    fn from(err: toml::de::Error) -> Self {
        KilnError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for KilnError {
    fn from(err: toml::ser::Error) -> Self {
        KilnError::TomlSerError(err.to_string())
    }
}
