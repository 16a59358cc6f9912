//! Import configuration profiles
//!
//! A profile is a named bundle of settings that controls how dropped files
//! are expanded into import trees and how committed manifests are filled in.
//! Profiles persist together in one TOML document:
//!
//! ```toml
//! [[profile]]
//! name = "Characters"
//!
//! [profile.animations]
//! separate_animation_prefix = "hero_"
//! fps = 24.0
//! ```

use kiln_asset::TextureRole;
use kiln_core::{KilnError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the built-in profile, always present in a library
pub const DEFAULT_PROFILE: &str = "Default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpAxis {
    XAxis,
    YAxis,
    ZAxis,
}

impl UpAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpAxis::XAxis => "X_AXIS",
            UpAxis::YAxis => "Y_AXIS",
            UpAxis::ZAxis => "Z_AXIS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LodType {
    TrailingNumber,
    DetectDts,
    SingleSize,
}

impl LodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LodType::TrailingNumber => "TrailingNumber",
            LodType::DetectDts => "DetectDTS",
            LodType::SingleSize => "SingleSize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionType {
    ConvexHull,
    Box,
    Sphere,
    Mesh,
}

impl CollisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionType::ConvexHull => "CreateConvexHull",
            CollisionType::Box => "Box",
            CollisionType::Sphere => "Sphere",
            CollisionType::Mesh => "Mesh",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Promote every warning to an error after validation
    pub warnings_as_errors: bool,
    /// Refuse the whole commit while any included item is in error
    pub prevent_import_with_errors: bool,
    /// Ask the file picker for replacements during refresh
    pub automatically_prompt_missing_files: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_axis_override: Option<UpAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_override: Option<f32>,
    pub ignore_node_scale: bool,
    pub adjust_center: bool,
    pub adjust_floor: bool,
    pub collapse_submeshes: bool,
    pub lod_type: LodType,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            up_axis_override: None,
            scale_override: None,
            ignore_node_scale: false,
            adjust_center: false,
            adjust_floor: false,
            collapse_submeshes: false,
            lod_type: LodType::TrailingNumber,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    pub import_materials: bool,
    /// Wildcard patterns (`*`) of material names that never become items
    pub ignore_materials: Vec<String>,
    /// Fill the composite (packed) texture slot of materials
    pub create_composites: bool,
    /// Reuse a registry material of the same name instead of flagging it
    pub use_existing_materials: bool,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            import_materials: true,
            ignore_materials: vec!["ColorEffect*".to_string()],
            create_composites: true,
            use_existing_materials: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub import_animations: bool,
    /// Split clips into their own animation assets
    pub separate_animations: bool,
    pub separate_animation_prefix: String,
    pub fps: f32,
    pub pad_rotation: bool,
    pub pad_transforms: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            import_animations: true,
            separate_animations: true,
            separate_animation_prefix: String::new(),
            fps: 30.0,
            pad_rotation: false,
            pad_transforms: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    pub generate_collisions: bool,
    pub collision_type: CollisionType,
    pub collision_mesh_prefix: String,
    pub generate_los_collisions: bool,
    pub los_collision_mesh_prefix: String,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            generate_collisions: false,
            collision_type: CollisionType::ConvexHull,
            collision_mesh_prefix: "Col".to_string(),
            generate_los_collisions: false,
            los_collision_mesh_prefix: "LOS".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Role assumed for images whose name matches no suffix
    pub image_type: TextureRole,
    pub diffuse_suffixes: Vec<String>,
    pub normal_suffixes: Vec<String>,
    pub roughness_suffixes: Vec<String>,
    pub ao_suffixes: Vec<String>,
    pub metalness_suffixes: Vec<String>,
    pub composite_suffixes: Vec<String>,
    pub specular_suffixes: Vec<String>,
    pub use_mips: bool,
    pub is_hdr: bool,
    pub scaling: f32,
    pub compressed: bool,
    /// Give every dropped image a generated material
    pub generate_material_on_import: bool,
}

fn suffixes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            image_type: TextureRole::Diffuse,
            diffuse_suffixes: suffixes(&[
                "_albedo", "_diffuse", "_ALBEDO", "_DIFFUSE", "_color", "_COLOR", "_d", "_D",
            ]),
            normal_suffixes: suffixes(&["_normal", "_NORMAL", "_n", "_N", "_nrm"]),
            roughness_suffixes: suffixes(&["_roughness", "_ROUGHNESS", "_r", "_R"]),
            ao_suffixes: suffixes(&["_ao", "_AO", "_occlusion"]),
            metalness_suffixes: suffixes(&["_metalness", "_METALNESS", "_metal", "_m", "_M"]),
            composite_suffixes: suffixes(&["_composite", "_COMPOSITE", "_c", "_C"]),
            specular_suffixes: suffixes(&["_specular", "_SPECULAR", "_spec", "_s", "_S"]),
            use_mips: true,
            is_hdr: false,
            scaling: 1.0,
            compressed: true,
            generate_material_on_import: false,
        }
    }
}

impl ImageSettings {
    /// Suffix table for a texture role
    pub fn suffixes_for(&self, role: TextureRole) -> &[String] {
        match role {
            TextureRole::Diffuse => &self.diffuse_suffixes,
            TextureRole::Normal => &self.normal_suffixes,
            TextureRole::Roughness => &self.roughness_suffixes,
            TextureRole::AmbientOcclusion => &self.ao_suffixes,
            TextureRole::Metalness => &self.metalness_suffixes,
            TextureRole::Composite => &self.composite_suffixes,
            TextureRole::Specular => &self.specular_suffixes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    pub volume_adjust: f32,
    pub pitch_adjust: f32,
    pub compressed: bool,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            volume_adjust: 1.0,
            pitch_adjust: 1.0,
            compressed: false,
        }
    }
}

/// A named import configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProfile {
    pub name: String,
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub mesh: MeshSettings,
    #[serde(default)]
    pub materials: MaterialSettings,
    #[serde(default)]
    pub animations: AnimationSettings,
    #[serde(default)]
    pub collision: CollisionSettings,
    #[serde(default)]
    pub images: ImageSettings,
    #[serde(default)]
    pub sounds: SoundSettings,
}

impl ImportProfile {
    /// A profile holding the hard-coded defaults under a new name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            general: GeneralSettings::default(),
            mesh: MeshSettings::default(),
            materials: MaterialSettings::default(),
            animations: AnimationSettings::default(),
            collision: CollisionSettings::default(),
            images: ImageSettings::default(),
            sounds: SoundSettings::default(),
        }
    }

    /// Whether a material name matches one of the ignore patterns
    pub fn ignores_material(&self, name: &str) -> bool {
        self.materials
            .ignore_materials
            .iter()
            .any(|pattern| wildcard_match(pattern, name))
    }
}

impl Default for ImportProfile {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE)
    }
}

/// Case-insensitive match where `*` stands for any run of characters
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == name;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !name.starts_with(first)
        || !name.ends_with(last)
        || name.len() < first.len() + last.len()
    {
        return false;
    }

    let mut rest = &name[first.len()..name.len() - last.len()];
    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle) {
            Some(pos) => rest = &rest[pos + middle.len()..],
            None => return false,
        }
    }
    true
}

/// TOML document holding every profile
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profile: Vec<ImportProfile>,
}

/// The persisted set of profiles.
///
/// Every mutation rewrites the backing document when the library was loaded
/// from a path.
#[derive(Debug, Clone)]
pub struct ProfileLibrary {
    path: Option<PathBuf>,
    profiles: Vec<ImportProfile>,
}

impl ProfileLibrary {
    /// A library with only the built-in profile and no backing document
    pub fn builtin() -> Self {
        Self {
            path: None,
            profiles: vec![ImportProfile::default()],
        }
    }

    /// Load the document at `path`; a missing document yields the built-in
    /// library bound to that path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut library = if path.exists() {
            let content = fs::read_to_string(path)?;
            Self::load_string(&content)?
        } else {
            Self::builtin()
        };
        library.path = Some(path.to_path_buf());
        Ok(library)
    }

    /// Parse a profile document without binding it to a path
    pub fn load_string(content: &str) -> Result<Self> {
        let file: ProfileFile = toml::from_str(content).map_err(|e| {
            KilnError::ProfileError(format!("Failed to parse profile TOML: {}", e))
        })?;

        let mut profiles: Vec<ImportProfile> = Vec::new();
        for profile in file.profile {
            if profiles.iter().any(|p| p.name == profile.name) {
                return Err(KilnError::ProfileError(format!(
                    "Duplicate profile name '{}'",
                    profile.name
                )));
            }
            profiles.push(profile);
        }

        if !profiles.iter().any(|p| p.name == DEFAULT_PROFILE) {
            profiles.insert(0, ImportProfile::default());
        }

        Ok(Self {
            path: None,
            profiles,
        })
    }

    /// Write the document back to its path, if it has one
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = ProfileFile {
            profile: self.profiles.clone(),
        };
        fs::write(path, toml::to_string_pretty(&file)?)?;
        info!("Saved {} profile(s) to {}", self.profiles.len(), path.display());
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&ImportProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn all(&self) -> &[ImportProfile] {
        &self.profiles
    }

    /// Add a new profile and persist
    pub fn add(&mut self, profile: ImportProfile) -> Result<()> {
        if self.get(&profile.name).is_some() {
            return Err(KilnError::ProfileError(format!(
                "Profile '{}' already exists",
                profile.name
            )));
        }
        self.profiles.push(profile);
        self.save()
    }

    /// Replace an existing profile of the same name and persist
    pub fn update(&mut self, profile: ImportProfile) -> Result<()> {
        let slot = self
            .profiles
            .iter_mut()
            .find(|p| p.name == profile.name)
            .ok_or_else(|| KilnError::ProfileNotFound(profile.name.clone()))?;
        *slot = profile;
        self.save()
    }

    /// Delete a profile and persist. The built-in profile cannot be deleted.
    pub fn remove(&mut self, name: &str) -> Result<ImportProfile> {
        if name == DEFAULT_PROFILE {
            return Err(KilnError::ProfileError(format!(
                "The '{}' profile cannot be deleted",
                DEFAULT_PROFILE
            )));
        }
        let index = self
            .profiles
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| KilnError::ProfileNotFound(name.to_string()))?;
        let removed = self.profiles.remove(index);
        self.save()?;
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("kiln_profiles_{}", uuid::Uuid::new_v4()))
            .join("profiles.toml")
    }

    #[test]
    fn test_parse_partial_profile_fills_defaults() {
        let toml_str = r#"
[[profile]]
name = "Characters"

[profile.animations]
separate_animation_prefix = "hero_"
fps = 24.0

[profile.mesh]
up_axis_override = "ZAxis"
scale_override = 0.01
"#;

        let library = ProfileLibrary::load_string(toml_str).unwrap();
        assert_eq!(library.names(), vec!["Default", "Characters"]);

        let profile = library.get("Characters").unwrap();
        assert_eq!(profile.animations.separate_animation_prefix, "hero_");
        assert_eq!(profile.animations.fps, 24.0);
        assert!(profile.animations.import_animations);
        assert_eq!(profile.mesh.up_axis_override, Some(UpAxis::ZAxis));
        assert_eq!(profile.mesh.scale_override, Some(0.01));
        assert_eq!(profile.images.normal_suffixes, ImageSettings::default().normal_suffixes);
    }

    #[test]
    fn test_duplicate_profile_names_rejected() {
        let toml_str = r#"
[[profile]]
name = "A"

[[profile]]
name = "A"
"#;
        assert!(ProfileLibrary::load_string(toml_str).is_err());
    }

    #[test]
    fn test_missing_document_is_builtin() {
        let path = temp_path();
        let library = ProfileLibrary::load(&path).unwrap();
        assert_eq!(library.names(), vec![DEFAULT_PROFILE]);
        assert_eq!(library.path(), Some(path.as_path()));
    }

    #[test]
    fn test_add_update_remove_persist() {
        let path = temp_path();
        let mut library = ProfileLibrary::load(&path).unwrap();

        let mut props = ImportProfile::new("Props");
        props.collision.generate_collisions = true;
        library.add(props.clone()).unwrap();
        assert!(library.add(props.clone()).is_err());

        let reloaded = ProfileLibrary::load(&path).unwrap();
        assert!(reloaded.get("Props").unwrap().collision.generate_collisions);

        props.sounds.volume_adjust = 0.5;
        library.update(props).unwrap();
        let reloaded = ProfileLibrary::load(&path).unwrap();
        assert_eq!(reloaded.get("Props").unwrap().sounds.volume_adjust, 0.5);

        library.remove("Props").unwrap();
        assert!(library.remove(DEFAULT_PROFILE).is_err());
        let reloaded = ProfileLibrary::load(&path).unwrap();
        assert!(reloaded.get("Props").is_none());

        if let Some(dir) = path.parent() {
            fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_update_unknown_profile() {
        let mut library = ProfileLibrary::builtin();
        let err = library.update(ImportProfile::new("Ghost")).unwrap_err();
        assert!(matches!(err, KilnError::ProfileNotFound(_)));
    }

    #[test]
    fn test_ignore_material_patterns() {
        let mut profile = ImportProfile::default();
        assert!(profile.ignores_material("ColorEffectR255G0B0"));
        assert!(profile.ignores_material("coloreffect_x"));
        assert!(!profile.ignores_material("Skin"));

        profile.materials.ignore_materials = vec!["*_proxy".to_string(), "Debug*Mat".to_string()];
        assert!(profile.ignores_material("wall_proxy"));
        assert!(profile.ignores_material("DebugRedMat"));
        assert!(!profile.ignores_material("DebugRed"));
        assert!(!profile.ignores_material("ColorEffectR255G0B0"));
    }

    #[test]
    fn test_suffix_tables_by_role() {
        let images = ImageSettings::default();
        assert!(images.suffixes_for(TextureRole::Normal).contains(&"_n".to_string()));
        assert!(images.suffixes_for(TextureRole::AmbientOcclusion).contains(&"_ao".to_string()));
    }
}
