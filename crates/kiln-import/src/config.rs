//! Layered project configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `KILN_DATA_ROOT`, `KILN_MODULE`, `KILN_PROFILE`
//! 2. Project-local: `.kiln/config.toml`
//! 3. Global: `~/.kiln/config.toml`
//!
//! ```toml
//! [import]
//! data_root = "game/data"
//! default_module = "Terrain"
//! active_profile = "Characters"
//! ```

use crate::profile::DEFAULT_PROFILE;
use kiln_core::{KilnError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[import]` table as written in a config file; unset keys fall through to
/// the layer below
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSection {
    #[serde(default)]
    pub data_root: Option<PathBuf>,
    #[serde(default)]
    pub default_module: Option<String>,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles_path: Option<PathBuf>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KilnConfigFile {
    #[serde(default)]
    pub import: ImportSection,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct KilnConfig {
    pub data_root: PathBuf,
    pub default_module: Option<String>,
    pub active_profile: String,
    pub profiles_path: PathBuf,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            default_module: None,
            active_profile: DEFAULT_PROFILE.to_string(),
            profiles_path: PathBuf::from(".kiln").join("profiles.toml"),
        }
    }
}

impl KilnConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = KilnConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = Self::project_config_path();
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config);
        Ok(Self::resolve(config))
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config);
        Ok(Self::resolve(config))
    }

    /// Where the project-local config lives, relative to the working directory
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".kiln").join("config.toml")
    }

    /// Write `active_profile` into the project-local config, keeping its
    /// other keys
    pub fn save_active_profile(name: &str) -> Result<()> {
        let path = Self::project_config_path();
        let mut config = if path.exists() {
            Self::load_file(&path)?
        } else {
            KilnConfigFile::default()
        };
        config.import.active_profile = Some(name.to_string());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(&config)?)?;
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".kiln").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<KilnConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let config: KilnConfigFile = toml::from_str(&content).map_err(|e| {
            KilnError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut KilnConfigFile, overlay: KilnConfigFile) {
        let overlay = overlay.import;
        let base = &mut base.import;
        if overlay.data_root.is_some() {
            base.data_root = overlay.data_root;
        }
        if overlay.default_module.is_some() {
            base.default_module = overlay.default_module;
        }
        if overlay.active_profile.is_some() {
            base.active_profile = overlay.active_profile;
        }
        if overlay.profiles_path.is_some() {
            base.profiles_path = overlay.profiles_path;
        }
    }

    fn apply_env_overrides(config: &mut KilnConfigFile) {
        if let Ok(root) = std::env::var("KILN_DATA_ROOT") {
            config.import.data_root = Some(PathBuf::from(root));
        }
        if let Ok(module) = std::env::var("KILN_MODULE") {
            config.import.default_module = Some(module);
        }
        if let Ok(profile) = std::env::var("KILN_PROFILE") {
            config.import.active_profile = Some(profile);
        }
    }

    fn resolve(file: KilnConfigFile) -> Self {
        let defaults = Self::default();
        let import = file.import;
        Self {
            data_root: import.data_root.unwrap_or(defaults.data_root),
            default_module: import.default_module,
            active_profile: import.active_profile.unwrap_or(defaults.active_profile),
            profiles_path: import.profiles_path.unwrap_or(defaults.profiles_path),
        }
    }
}
