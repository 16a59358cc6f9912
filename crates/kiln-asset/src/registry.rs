//! Module-scoped asset registry

use crate::types::{read_manifest, AssetId, AssetKind, ManifestRecord, MANIFEST_SUFFIX};
use kiln_core::{KilnError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File that declares a directory under the data root as a module
pub const MODULE_FILE: &str = "module.toml";

/// Catalog the import pipeline commits into.
///
/// Names are unique per module. Reads after a write in the same process see
/// the write.
pub trait AssetRegistry {
    /// Whether a module with this name is declared
    fn module_exists(&self, module: &str) -> bool;

    /// Look up an asset by module and name
    fn find_by_name(&self, module: &str, name: &str) -> Option<AssetId>;

    /// Declare a new asset from a manifest written on disk
    fn add_declared_asset(&mut self, module: &str, manifest_path: &Path) -> Result<AssetId>;

    /// Re-read an already declared asset's manifest
    fn refresh_asset(&mut self, id: &AssetId) -> Result<()>;

    /// Module a registered asset belongs to
    fn asset_module(&self, id: &AssetId) -> Option<String>;

    /// Files on disk behind a registered asset: its manifest first, then
    /// the copied source if it has one
    fn asset_files(&self, _id: &AssetId) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// An asset known to the registry
#[derive(Debug, Clone)]
pub struct RegisteredAsset {
    pub record: ManifestRecord,
    pub manifest_path: PathBuf,
}

impl RegisteredAsset {
    pub fn id(&self) -> AssetId {
        self.record.id()
    }

    pub fn kind(&self) -> AssetKind {
        self.record.kind()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModuleFile {
    module: ModuleDecl,
}

#[derive(Debug)]
struct ModuleEntry {
    decl: ModuleDecl,
    assets: BTreeMap<String, RegisteredAsset>,
}

/// Registry backed by a data directory.
///
/// Layout: `<root>/<Module>/module.toml` declares a module, and every
/// `*.asset.toml` found below that directory is one of its assets.
#[derive(Debug)]
pub struct ModuleRegistry {
    root: PathBuf,
    modules: BTreeMap<String, ModuleEntry>,
}

impl ModuleRegistry {
    /// Create an empty registry rooted at `root` without touching the disk
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            modules: BTreeMap::new(),
        }
    }

    /// Load every declared module and its manifests below `root`
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let mut registry = Self::new(root);
        if !registry.root.exists() {
            return Ok(registry);
        }

        for entry in fs::read_dir(&registry.root)? {
            let dir = entry?.path();
            let module_file = dir.join(MODULE_FILE);
            if !dir.is_dir() || !module_file.exists() {
                continue;
            }

            let content = fs::read_to_string(&module_file)?;
            let file: ModuleFile = toml::from_str(&content).map_err(|e| {
                KilnError::AssetError(format!("Failed to parse {}: {}", module_file.display(), e))
            })?;

            let mut module = ModuleEntry {
                decl: file.module,
                assets: BTreeMap::new(),
            };
            Self::scan_directory(&mut module, &dir)?;
            debug!(
                "Loaded module '{}' with {} asset(s)",
                module.decl.name,
                module.assets.len()
            );
            registry.modules.insert(module.decl.name.clone(), module);
        }

        Ok(registry)
    }

    fn scan_directory(module: &mut ModuleEntry, dir: &Path) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::scan_directory(module, &path)?;
            } else if is_manifest(&path) {
                let record = read_manifest(&path)?;
                module.assets.insert(
                    record.name.clone(),
                    RegisteredAsset {
                        record,
                        manifest_path: path,
                    },
                );
            }
        }
        Ok(())
    }

    /// Root data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a module's assets live in
    pub fn module_dir(&self, module: &str) -> PathBuf {
        self.root.join(module)
    }

    /// Declare a new module, writing its `module.toml`
    pub fn create_module(&mut self, name: &str, description: Option<String>) -> Result<()> {
        if self.modules.contains_key(name) {
            return Err(KilnError::AssetError(format!(
                "Module '{}' already exists",
                name
            )));
        }

        let dir = self.module_dir(name);
        fs::create_dir_all(&dir)?;
        let decl = ModuleDecl {
            name: name.to_string(),
            description,
        };
        let content = toml::to_string_pretty(&ModuleFile {
            module: decl.clone(),
        })?;
        fs::write(dir.join(MODULE_FILE), content)?;

        info!("Created module '{}' at {}", name, dir.display());
        self.modules.insert(
            name.to_string(),
            ModuleEntry {
                decl,
                assets: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Declared module names
    pub fn modules(&self) -> Vec<&ModuleDecl> {
        self.modules.values().map(|m| &m.decl).collect()
    }

    /// Get a registered asset
    pub fn get(&self, id: &AssetId) -> Option<&RegisteredAsset> {
        self.modules
            .get(&id.module)
            .and_then(|m| m.assets.get(&id.name))
    }

    /// All assets of one module
    pub fn by_module(&self, module: &str) -> Vec<&RegisteredAsset> {
        self.modules
            .get(module)
            .map(|m| m.assets.values().collect())
            .unwrap_or_default()
    }

    /// All assets of a given kind, across modules
    pub fn by_kind(&self, kind: AssetKind) -> Vec<&RegisteredAsset> {
        self.modules
            .values()
            .flat_map(|m| m.assets.values())
            .filter(|a| a.kind() == kind)
            .collect()
    }

    /// Total number of registered assets
    pub fn len(&self) -> usize {
        self.modules.values().map(|m| m.assets.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetRegistry for ModuleRegistry {
    fn module_exists(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    fn find_by_name(&self, module: &str, name: &str) -> Option<AssetId> {
        self.modules
            .get(module)
            .and_then(|m| m.assets.get(name))
            .map(|a| a.id())
    }

    fn add_declared_asset(&mut self, module: &str, manifest_path: &Path) -> Result<AssetId> {
        let entry = self
            .modules
            .get_mut(module)
            .ok_or_else(|| KilnError::ModuleNotFound(module.to_string()))?;

        let record = read_manifest(manifest_path)?;
        if record.module != module {
            return Err(KilnError::AssetError(format!(
                "Manifest {} declares module '{}', expected '{}'",
                manifest_path.display(),
                record.module,
                module
            )));
        }

        let id = record.id();
        info!("Declared asset {} ({})", id, record.kind());
        entry.assets.insert(
            record.name.clone(),
            RegisteredAsset {
                record,
                manifest_path: manifest_path.to_path_buf(),
            },
        );
        Ok(id)
    }

    fn refresh_asset(&mut self, id: &AssetId) -> Result<()> {
        let asset = self
            .modules
            .get_mut(&id.module)
            .and_then(|m| m.assets.get_mut(&id.name))
            .ok_or_else(|| KilnError::AssetError(format!("Asset not registered: {}", id)))?;

        asset.record = read_manifest(&asset.manifest_path)?;
        info!("Refreshed asset {}", id);
        Ok(())
    }

    fn asset_module(&self, id: &AssetId) -> Option<String> {
        self.get(id).map(|a| a.record.module.clone())
    }

    fn asset_files(&self, id: &AssetId) -> Vec<PathBuf> {
        let Some(asset) = self.get(id) else {
            return Vec::new();
        };
        let mut files = vec![asset.manifest_path.clone()];
        if let (Some(file), Some(dir)) = (&asset.record.file, asset.manifest_path.parent()) {
            files.push(dir.join(file));
        }
        files
    }
}

fn is_manifest(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(MANIFEST_SUFFIX))
        .unwrap_or(false)
}
