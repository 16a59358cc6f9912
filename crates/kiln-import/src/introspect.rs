//! Shape introspection: what a model file contains

use kiln_core::{KilnError, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// An animation clip found in a shape
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    pub name: String,
    /// Clip length in seconds
    pub duration: f32,
}

/// A material referenced by a shape
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRef {
    pub name: String,
    /// Image file the material points at, when the format records one
    pub path: Option<PathBuf>,
}

/// Enumeration of a shape's meshes, clips and materials
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeSummary {
    pub mesh_count: usize,
    pub clips: Vec<ClipInfo>,
    pub materials: Vec<MaterialRef>,
}

impl ShapeSummary {
    /// No meshes and no clips: nothing importable
    pub fn is_malformed(&self) -> bool {
        self.mesh_count == 0 && self.clips.is_empty()
    }

    /// Only clips: an animation file rather than a shape
    pub fn is_animation_only(&self) -> bool {
        self.mesh_count == 0 && !self.clips.is_empty()
    }
}

/// Opens model files and reports their contents.
///
/// Unreadable or garbage input should come back as an empty summary. An
/// `Err`, such as a format the introspector cannot open, aborts the import
/// of that file.
pub trait ShapeIntrospector {
    fn introspect(&self, path: &Path) -> Result<ShapeSummary>;
}

/// Introspector for glTF and GLB files
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfIntrospector;

impl ShapeIntrospector for GltfIntrospector {
    fn introspect(&self, path: &Path) -> Result<ShapeSummary> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if ext != "gltf" && ext != "glb" {
            return Err(KilnError::ImportError(format!(
                "No introspector for .{} files, cannot read {}",
                ext,
                path.display()
            )));
        }

        let gltf = match gltf::Gltf::open(path) {
            Ok(gltf) => gltf,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return Ok(ShapeSummary::default());
            }
        };
        let document = &gltf.document;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let clips = document
            .animations()
            .map(|animation| {
                let name = animation
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("animation_{}", animation.index()));
                let duration = animation
                    .channels()
                    .filter_map(|channel| channel.sampler().input().max())
                    .filter_map(|max| max.as_array().and_then(|a| a.first()).and_then(|v| v.as_f64()))
                    .fold(0.0f64, f64::max);
                ClipInfo {
                    name,
                    duration: duration as f32,
                }
            })
            .collect();

        let materials = document
            .materials()
            .map(|material| {
                let name = material
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(0)));

                let path = material
                    .pbr_metallic_roughness()
                    .base_color_texture()
                    .and_then(|info| match info.texture().source().source() {
                        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                            Some(base_dir.join(uri))
                        }
                        _ => None,
                    });

                MaterialRef { name, path }
            })
            .collect();

        let summary = ShapeSummary {
            mesh_count: document.meshes().count(),
            clips,
            materials,
        };
        debug!(
            "{}: {} mesh(es), {} clip(s), {} material(s)",
            path.display(),
            summary.mesh_count,
            summary.clips.len(),
            summary.materials.len()
        );
        Ok(summary)
    }
}
