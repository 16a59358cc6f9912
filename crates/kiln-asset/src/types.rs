//! Asset kinds, identifiers and manifest records

use kiln_core::{KilnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Extension shared by every manifest sidecar
pub const MANIFEST_SUFFIX: &str = ".asset.toml";

/// Kinds of assets the importer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Model,
    Animation,
    Material,
    Sound,
    Script,
    Gui,
}

impl AssetKind {
    /// Directory below `<data>/<module>/` that assets of this kind commit into
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetKind::Image => "Images",
            AssetKind::Model => "Shapes",
            AssetKind::Animation => "ShapeAnimations",
            AssetKind::Material => "Materials",
            AssetKind::Sound => "Sounds",
            AssetKind::Script => "Scripts",
            AssetKind::Gui => "GUIs",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Model => "model",
            AssetKind::Animation => "animation",
            AssetKind::Material => "material",
            AssetKind::Sound => "sound",
            AssetKind::Script => "script",
            AssetKind::Gui => "gui",
        }
    }

    /// Parse a lowercase kind name (as used on the command line)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Some(AssetKind::Image),
            "model" => Some(AssetKind::Model),
            "animation" => Some(AssetKind::Animation),
            "material" => Some(AssetKind::Material),
            "sound" => Some(AssetKind::Sound),
            "script" => Some(AssetKind::Script),
            "gui" => Some(AssetKind::Gui),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssetKind::Image => "Image",
            AssetKind::Model => "Model",
            AssetKind::Animation => "Animation",
            AssetKind::Material => "Material",
            AssetKind::Sound => "Sound",
            AssetKind::Script => "Script",
            AssetKind::Gui => "GUI",
        };
        f.write_str(label)
    }
}

/// Module-scoped asset identity, displayed as `Module:name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId {
    pub module: String,
    pub name: String,
}

impl AssetId {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Parse `Module:name`
    pub fn parse(s: &str) -> Option<Self> {
        let (module, name) = s.split_once(':')?;
        if module.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(module, name))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

/// Role a texture plays inside a material.
///
/// Variant order is the precedence used when matching name suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureRole {
    Diffuse,
    Normal,
    Roughness,
    AmbientOcclusion,
    Metalness,
    Composite,
    Specular,
}

impl TextureRole {
    /// All roles in suffix-matching precedence order
    pub const PRECEDENCE: [TextureRole; 7] = [
        TextureRole::Diffuse,
        TextureRole::Normal,
        TextureRole::Roughness,
        TextureRole::AmbientOcclusion,
        TextureRole::Metalness,
        TextureRole::Composite,
        TextureRole::Specular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextureRole::Diffuse => "diffuse",
            TextureRole::Normal => "normal",
            TextureRole::Roughness => "roughness",
            TextureRole::AmbientOcclusion => "ambient_occlusion",
            TextureRole::Metalness => "metalness",
            TextureRole::Composite => "composite",
            TextureRole::Specular => "specular",
        }
    }
}

/// A texture slot reference inside a material manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextureRef {
    /// Another image asset, as `Module:name`
    Asset { asset: String },
    /// A file copied next to the material manifest
    File { file: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub image_type: TextureRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub use_mips: bool,
    pub is_hdr: bool,
    pub scaling: f32,
    pub compressed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    pub collision_type: String,
    pub mesh_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub los_mesh_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub mesh_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    pub ignore_node_scale: bool,
    pub adjust_center: bool,
    pub adjust_floor: bool,
    pub collapse_submeshes: bool,
    pub lod_type: String,
    /// Clips kept inside the shape when animations are not split out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded_clips: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision: Option<CollisionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationRecord {
    pub start_frame: u32,
    pub end_frame: u32,
    pub pad_rotation: bool,
    pub pad_transforms: bool,
    /// Shape asset the clip was split out of, as `Module:name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialRecord {
    /// Texture slots keyed by role name
    #[serde(default)]
    pub maps: BTreeMap<String, TextureRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundRecord {
    pub volume: f32,
    pub pitch: f32,
    pub compressed: bool,
}

/// Kind-specific part of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordDetails {
    Image(ImageRecord),
    Model(ModelRecord),
    Animation(AnimationRecord),
    Material(MaterialRecord),
    Sound(SoundRecord),
    Script,
    Gui,
}

impl RecordDetails {
    pub fn kind(&self) -> AssetKind {
        match self {
            RecordDetails::Image(_) => AssetKind::Image,
            RecordDetails::Model(_) => AssetKind::Model,
            RecordDetails::Animation(_) => AssetKind::Animation,
            RecordDetails::Material(_) => AssetKind::Material,
            RecordDetails::Sound(_) => AssetKind::Sound,
            RecordDetails::Script => AssetKind::Script,
            RecordDetails::Gui => AssetKind::Gui,
        }
    }
}

/// Descriptor written next to every committed asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub name: String,
    pub module: String,
    /// Copied source file, relative to the manifest's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    pub details: RecordDetails,
}

impl ManifestRecord {
    pub fn kind(&self) -> AssetKind {
        self.details.kind()
    }

    pub fn id(&self) -> AssetId {
        AssetId::new(&self.module, &self.name)
    }
}

/// TOML sidecar file format for a manifest
#[derive(Debug, Serialize, Deserialize)]
pub struct AssetFile {
    pub asset: ManifestRecord,
}

/// Read a manifest sidecar from disk
pub fn read_manifest(path: &Path) -> Result<ManifestRecord> {
    let content = std::fs::read_to_string(path)?;
    let file: AssetFile = toml::from_str(&content).map_err(|e| {
        KilnError::AssetError(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    Ok(file.asset)
}

/// Serialize a manifest into sidecar TOML
pub fn manifest_to_string(record: &ManifestRecord) -> Result<String> {
    #[derive(Serialize)]
    struct Sidecar<'a> {
        asset: &'a ManifestRecord,
    }

    Ok(toml::to_string_pretty(&Sidecar { asset: record })?)
}
