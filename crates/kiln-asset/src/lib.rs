//! Kiln Asset - Manifests and the module-scoped asset registry
//!
//! This crate provides the asset kinds and manifest records the importer
//! writes, the registry it commits into, and the file primitives used to
//! copy sources and write sidecars.

mod fs;
mod registry;
mod types;

pub use fs::{AssetFs, LocalFs};
pub use registry::{AssetRegistry, ModuleDecl, ModuleRegistry, RegisteredAsset, MODULE_FILE};
pub use types::{
    manifest_to_string, read_manifest, AnimationRecord, AssetFile, AssetId, AssetKind,
    CollisionRecord, ImageRecord, ManifestRecord, MaterialRecord, ModelRecord, RecordDetails,
    SoundRecord, TextureRef, TextureRole, MANIFEST_SUFFIX,
};
