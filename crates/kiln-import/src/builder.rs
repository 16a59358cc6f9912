//! Import tree builder: roots from dropped files, children from introspection

use crate::classify::{classify, derive_asset_name, sanitize_name, FileClass, ADJACENT_IMAGE_EXTENSIONS};
use crate::introspect::{ClipInfo, ShapeIntrospector};
use crate::item::{AnimationFields, ImportItem, ItemFields, ModelFields};
use crate::materials::{assign_texture_roles, image_fields, strip_role_suffix};
use crate::profile::ImportProfile;
use crate::tree::Batch;
use kiln_asset::{AssetFs, AssetKind};
use kiln_core::{ItemId, KilnError, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Expands dropped files into import trees under one profile
pub struct TreeBuilder<'a> {
    profile: &'a ImportProfile,
    introspector: &'a dyn ShapeIntrospector,
    fs: &'a dyn AssetFs,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        profile: &'a ImportProfile,
        introspector: &'a dyn ShapeIntrospector,
        fs: &'a dyn AssetFs,
    ) -> Self {
        Self {
            profile,
            introspector,
            fs,
        }
    }

    /// Classify `path` and add it to the batch as an expanded root.
    ///
    /// Unknown files yield `Ok(None)` and add nothing. A malformed model is
    /// rejected with an error and leaves the batch as it was.
    pub fn add_root(&self, batch: &mut Batch, path: &Path, module: &str) -> Result<Option<ItemId>> {
        let kind = match classify(path) {
            FileClass::Asset(kind) => kind,
            FileClass::Archive => {
                return Err(KilnError::ImportError(format!(
                    "{} is an archive and must be extracted before import",
                    path.display()
                )))
            }
            FileClass::Unknown => {
                debug!("Ignoring unrecognized file {}", path.display());
                return Ok(None);
            }
        };

        let item = ImportItem::new(kind, derive_asset_name(path), Some(path.to_path_buf()), module);
        let id = batch.insert_root(item);
        if let Err(e) = self.expand(batch, id) {
            batch.remove(id)?;
            return Err(e);
        }
        debug!("Added {} '{}' from {}", kind, batch.item(id)?.asset_name, path.display());
        Ok(Some(id))
    }

    /// Expand an item and then its unprocessed children.
    ///
    /// A processed item is left untouched. Expanding an unprocessed item
    /// first discards any children it derived earlier, so a reset item is
    /// rebuilt from scratch. Returns the number of items created.
    pub fn expand(&self, batch: &mut Batch, id: ItemId) -> Result<usize> {
        let item = batch.item(id)?;
        if item.processed {
            return Ok(0);
        }

        let stale: Vec<ItemId> = item
            .children()
            .iter()
            .copied()
            .filter(|c| batch.get(*c).map(|i| i.derived).unwrap_or(false))
            .collect();
        for child in stale {
            batch.remove(child)?;
        }

        let mut created = match batch.item(id)?.kind {
            AssetKind::Model => self.expand_model(batch, id)?,
            AssetKind::Image => self.expand_image(batch, id)?,
            AssetKind::Animation => {
                let item = batch.item_mut(id)?;
                if item.fields == ItemFields::None {
                    item.fields = ItemFields::Animation(self.animation_fields(None));
                }
                0
            }
            AssetKind::Material => {
                let fields = assign_texture_roles(batch, id, self.profile);
                batch.item_mut(id)?.fields = ItemFields::Material(fields);
                0
            }
            AssetKind::Sound | AssetKind::Script | AssetKind::Gui => 0,
        };
        batch.item_mut(id)?.processed = true;

        let children = batch.item(id)?.children().to_vec();
        for child in children {
            if !batch.item(child)?.processed {
                created += self.expand(batch, child)?;
            }
        }
        Ok(created)
    }

    /// Expand every unprocessed live item, returning how many items were
    /// created. Roots that fail to expand are removed and reported.
    pub fn expand_all(&self, batch: &mut Batch) -> (usize, Vec<(String, KilnError)>) {
        let mut created = 0;
        let mut rejected = Vec::new();

        for id in batch.preorder() {
            let Some(item) = batch.get(id) else {
                continue;
            };
            if item.processed {
                continue;
            }
            let name = item.asset_name.clone();
            match self.expand(batch, id) {
                Ok(n) => created += n,
                Err(e) => {
                    warn!("Rejected '{}': {}", name, e);
                    if batch.remove(id).is_ok() {
                        rejected.push((name, e));
                    }
                }
            }
        }
        (created, rejected)
    }

    fn expand_model(&self, batch: &mut Batch, id: ItemId) -> Result<usize> {
        let item = batch.item(id)?;
        let module = item.module_name.clone();
        let Some(source) = item.source_path.clone() else {
            return Ok(0);
        };
        if !self.fs.exists(&source) {
            debug!("Not introspecting missing model {}", source.display());
            return Ok(0);
        }

        let summary = self.introspector.introspect(&source)?;
        if summary.is_malformed() {
            return Err(KilnError::MalformedModel(source.display().to_string()));
        }

        let animations = &self.profile.animations;
        if summary.is_animation_only() {
            let longest = summary
                .clips
                .iter()
                .max_by(|a, b| a.duration.total_cmp(&b.duration));
            let item = batch.item_mut(id)?;
            item.kind = AssetKind::Animation;
            item.fields = ItemFields::Animation(self.animation_fields(longest));
            debug!("{} holds only animation, importing as animation", source.display());
            return Ok(0);
        }

        let split_clips = animations.import_animations && animations.separate_animations;
        let embedded_clips = if animations.import_animations && !split_clips {
            summary.clips.iter().map(|c| c.name.clone()).collect()
        } else {
            Vec::new()
        };
        {
            let item = batch.item_mut(id)?;
            item.kind = AssetKind::Model;
            item.fields = ItemFields::Model(ModelFields {
                mesh_count: summary.mesh_count,
                embedded_clips,
            });
        }

        let mut created = 0;
        if split_clips {
            for clip in &summary.clips {
                let name = sanitize_name(&format!("{}{}", animations.separate_animation_prefix, clip.name));
                let mut child = ImportItem::new(AssetKind::Animation, name, Some(source.clone()), &module);
                child.derived = true;
                child.fields = ItemFields::Animation(self.animation_fields(Some(clip)));
                if self.add_derived(batch, id, child)? {
                    created += 1;
                }
            }
        }

        if self.profile.materials.import_materials {
            let dir = source.parent().unwrap_or_else(|| Path::new(""));
            for material in &summary.materials {
                if self.profile.ignores_material(&material.name) {
                    debug!("Ignoring material '{}'", material.name);
                    continue;
                }
                let image = material
                    .path
                    .clone()
                    .filter(|p| self.fs.exists(p))
                    .or_else(|| find_adjacent_image(self.fs, dir, &material.name));
                if image.is_none() {
                    debug!("No image found for material '{}'", material.name);
                }

                let mut child = ImportItem::new(AssetKind::Material, sanitize_name(&material.name), image, &module);
                child.derived = true;
                if self.add_derived(batch, id, child)? {
                    created += 1;
                }
            }
        }

        Ok(created)
    }

    fn expand_image(&self, batch: &mut Batch, id: ItemId) -> Result<usize> {
        let images = &self.profile.images;
        let item = batch.item_mut(id)?;
        item.fields = ItemFields::Image(image_fields(&item.asset_name, images));

        if !images.generate_material_on_import || item.parent().is_some() {
            return Ok(0);
        }

        let name = format!("{}_mat", strip_role_suffix(&item.asset_name, images));
        let mut material = ImportItem::new(AssetKind::Material, name, None, item.module_name.clone());
        material.derived = true;
        material.generated = true;
        Ok(usize::from(self.add_derived(batch, id, material)?))
    }

    /// Insert a derived child unless it would alias its own lineage
    fn add_derived(&self, batch: &mut Batch, parent: ItemId, child: ImportItem) -> Result<bool> {
        if batch.aliases_lineage(parent, &child) {
            warn!(
                "Not deriving {} '{}': it aliases an ancestor",
                child.kind, child.asset_name
            );
            return Ok(false);
        }
        batch.insert_child(parent, child)?;
        Ok(true)
    }

    fn animation_fields(&self, clip: Option<&ClipInfo>) -> AnimationFields {
        let animations = &self.profile.animations;
        let end_frame = clip
            .map(|c| (c.duration.max(0.0) * animations.fps).round() as u32)
            .unwrap_or(0);
        AnimationFields {
            start_frame: 0,
            end_frame,
            pad_rotation: animations.pad_rotation,
            pad_transforms: animations.pad_transforms,
        }
    }
}

/// Look for `<name>.<ext>` next to a model, trying extensions in priority
/// order
pub fn find_adjacent_image(fs: &dyn AssetFs, dir: &Path, name: &str) -> Option<PathBuf> {
    ADJACENT_IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", name, ext)))
        .find(|candidate| fs.exists(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{MaterialRef, ShapeSummary};
    use kiln_asset::{LocalFs, ManifestRecord, TextureRole};
    use std::collections::{HashMap, HashSet};

    /// Scripted shapes keyed by file name
    #[derive(Default)]
    struct FakeShapes(HashMap<String, ShapeSummary>);

    impl FakeShapes {
        fn with(mut self, file: &str, summary: ShapeSummary) -> Self {
            self.0.insert(file.to_string(), summary);
            self
        }
    }

    impl ShapeIntrospector for FakeShapes {
        fn introspect(&self, path: &Path) -> Result<ShapeSummary> {
            let file = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            Ok(self.0.get(file).cloned().unwrap_or_default())
        }
    }

    /// Filesystem where only the listed paths exist
    struct FakeFs(HashSet<PathBuf>);

    impl FakeFs {
        fn with(files: &[&str]) -> Self {
            Self(files.iter().map(PathBuf::from).collect())
        }
    }

    impl AssetFs for FakeFs {
        fn exists(&self, path: &Path) -> bool {
            self.0.contains(path)
        }
        fn copy(&self, _: &Path, _: &Path, _: bool) -> Result<()> {
            Ok(())
        }
        fn write_manifest(&self, _: &ManifestRecord, _: &Path) -> Result<()> {
            Ok(())
        }
        fn remove(&self, _: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn clip(name: &str, duration: f32) -> ClipInfo {
        ClipInfo {
            name: name.to_string(),
            duration,
        }
    }

    fn material(name: &str) -> MaterialRef {
        MaterialRef {
            name: name.to_string(),
            path: None,
        }
    }

    fn hero() -> ShapeSummary {
        ShapeSummary {
            mesh_count: 1,
            clips: vec![clip("Walk", 1.0)],
            materials: vec![material("Skin")],
        }
    }

    fn child_names(batch: &Batch, id: ItemId) -> Vec<(AssetKind, String)> {
        batch
            .item(id)
            .unwrap()
            .children()
            .iter()
            .map(|c| {
                let item = batch.item(*c).unwrap();
                (item.kind, item.asset_name.clone())
            })
            .collect()
    }

    #[test]
    fn test_image_root_has_no_children() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/grass.png"]);
        let shapes = FakeShapes::default();
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/grass.png"), "Terrain")
            .unwrap()
            .unwrap();
        let item = batch.item(id).unwrap();
        assert_eq!(item.kind, AssetKind::Image);
        assert_eq!(item.asset_name, "grass");
        assert!(item.processed);
        assert!(item.children().is_empty());
        assert!(matches!(&item.fields, ItemFields::Image(f) if f.role == TextureRole::Diffuse));
    }

    #[test]
    fn test_unknown_file_adds_nothing() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/readme.txt"]);
        let shapes = FakeShapes::default();
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        assert!(builder
            .add_root(&mut batch, Path::new("/art/readme.txt"), "Game")
            .unwrap()
            .is_none());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_model_expands_animations_and_materials() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/hero.dae"]);
        let shapes = FakeShapes::default().with("hero.dae", hero());
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/hero.dae"), "Characters")
            .unwrap()
            .unwrap();
        assert_eq!(
            child_names(&batch, id),
            vec![
                (AssetKind::Animation, "Walk".to_string()),
                (AssetKind::Material, "Skin".to_string()),
            ]
        );

        let children = batch.item(id).unwrap().children().to_vec();
        let walk = batch.item(children[0]).unwrap();
        assert_eq!(walk.source(), Some(Path::new("/art/hero.dae")));
        assert!(matches!(&walk.fields, ItemFields::Animation(f) if f.end_frame == 30));
        let skin = batch.item(children[1]).unwrap();
        assert!(skin.source().is_none());
        assert!(skin.processed);
    }

    #[test]
    fn test_expand_is_idempotent() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/hero.dae"]);
        let shapes = FakeShapes::default().with("hero.dae", hero());
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/hero.dae"), "Characters")
            .unwrap()
            .unwrap();
        let before = batch.preorder();
        assert_eq!(builder.expand(&mut batch, id).unwrap(), 0);
        assert_eq!(builder.expand_all(&mut batch).0, 0);
        assert_eq!(batch.preorder(), before);
    }

    #[test]
    fn test_reset_model_rebuilds_without_duplicates() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/hero.dae"]);
        let shapes = FakeShapes::default().with("hero.dae", hero());
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/hero.dae"), "Characters")
            .unwrap()
            .unwrap();
        batch.item_mut(id).unwrap().processed = false;
        assert_eq!(builder.expand(&mut batch, id).unwrap(), 2);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_malformed_model_rejected() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/hero.png", "/art/broken.dae"]);
        let shapes = FakeShapes::default();
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();
        builder
            .add_root(&mut batch, Path::new("/art/hero.png"), "Game")
            .unwrap();

        let err = builder
            .add_root(&mut batch, Path::new("/art/broken.dae"), "Game")
            .unwrap_err();
        assert!(matches!(err, KilnError::MalformedModel(_)));
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.roots().len(), 1);
    }

    #[test]
    fn test_unreadable_format_is_not_malformed() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/hero.dae"]);
        let shapes = crate::introspect::GltfIntrospector;
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let err = builder
            .add_root(&mut batch, Path::new("/art/hero.dae"), "Game")
            .unwrap_err();
        assert!(matches!(err, KilnError::ImportError(ref m) if m.contains(".dae")));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_animation_only_model_reclassified() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/run.dae"]);
        let shapes = FakeShapes::default().with(
            "run.dae",
            ShapeSummary {
                mesh_count: 0,
                clips: vec![clip("Run", 0.5), clip("RunFast", 2.0)],
                materials: vec![material("Skin")],
            },
        );
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/run.dae"), "Game")
            .unwrap()
            .unwrap();
        let item = batch.item(id).unwrap();
        assert_eq!(item.kind, AssetKind::Animation);
        assert!(item.children().is_empty());
        assert!(matches!(&item.fields, ItemFields::Animation(f) if f.end_frame == 60));
    }

    #[test]
    fn test_material_resolves_adjacent_image_by_priority() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/hero.dae", "/art/Skin.png", "/art/Skin.tif"]);
        let shapes = FakeShapes::default().with("hero.dae", hero());
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/hero.dae"), "Characters")
            .unwrap()
            .unwrap();
        let skin = batch.item(id).unwrap().children()[1];
        assert_eq!(
            batch.item(skin).unwrap().source(),
            Some(Path::new("/art/Skin.png"))
        );
        assert!(matches!(
            &batch.item(skin).unwrap().fields,
            ItemFields::Material(f) if f.maps.contains_key(&TextureRole::Diffuse)
        ));
    }

    #[test]
    fn test_introspected_material_path_preferred() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&["/art/hero.dae", "/art/Skin.jpg", "/tex/skin_final.png"]);
        let mut summary = hero();
        summary.materials[0].path = Some(PathBuf::from("/tex/skin_final.png"));
        let shapes = FakeShapes::default().with("hero.dae", summary);
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/hero.dae"), "Characters")
            .unwrap()
            .unwrap();
        let skin = batch.item(id).unwrap().children()[1];
        assert_eq!(
            batch.item(skin).unwrap().source(),
            Some(Path::new("/tex/skin_final.png"))
        );
    }

    #[test]
    fn test_profile_controls_children() {
        let mut profile = ImportProfile::default();
        profile.animations.separate_animations = false;
        profile.materials.ignore_materials = vec!["Sk*".to_string()];
        let fs = FakeFs::with(&["/art/hero.dae"]);
        let shapes = FakeShapes::default().with("hero.dae", hero());
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/hero.dae"), "Characters")
            .unwrap()
            .unwrap();
        let item = batch.item(id).unwrap();
        assert!(item.children().is_empty());
        assert!(matches!(
            &item.fields,
            ItemFields::Model(f) if f.embedded_clips == vec!["Walk".to_string()]
        ));
    }

    #[test]
    fn test_animation_prefix_applied() {
        let mut profile = ImportProfile::default();
        profile.animations.separate_animation_prefix = "hero_".to_string();
        profile.materials.import_materials = false;
        let fs = FakeFs::with(&["/art/hero.dae"]);
        let shapes = FakeShapes::default().with("hero.dae", hero());
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/hero.dae"), "Characters")
            .unwrap()
            .unwrap();
        assert_eq!(
            child_names(&batch, id),
            vec![(AssetKind::Animation, "hero_Walk".to_string())]
        );
    }

    #[test]
    fn test_generated_material_on_image_import() {
        let mut profile = ImportProfile::default();
        profile.images.generate_material_on_import = true;
        let fs = FakeFs::with(&["/art/rock_albedo.png"]);
        let shapes = FakeShapes::default();
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/art/rock_albedo.png"), "Terrain")
            .unwrap()
            .unwrap();
        let children = batch.item(id).unwrap().children().to_vec();
        assert_eq!(children.len(), 1);
        let material = batch.item(children[0]).unwrap();
        assert_eq!(material.asset_name, "rock_mat");
        assert!(material.generated);
        assert!(matches!(
            &material.fields,
            ItemFields::Material(f) if f.maps.len() == 1
        ));
    }

    #[test]
    fn test_missing_model_not_introspected() {
        let profile = ImportProfile::default();
        let fs = FakeFs::with(&[]);
        let shapes = FakeShapes::default();
        let builder = TreeBuilder::new(&profile, &shapes, &fs);
        let mut batch = Batch::new();

        let id = builder
            .add_root(&mut batch, Path::new("/gone/hero.dae"), "Game")
            .unwrap()
            .unwrap();
        assert!(batch.item(id).unwrap().processed);
        assert!(batch.item(id).unwrap().children().is_empty());
    }

    #[test]
    fn test_find_adjacent_image_order() {
        let fs = FakeFs::with(&["/art/Skin.dds", "/art/Skin.jpg"]);
        assert_eq!(
            find_adjacent_image(&fs, Path::new("/art"), "Skin"),
            Some(PathBuf::from("/art/Skin.jpg"))
        );
        assert_eq!(find_adjacent_image(&LocalFs, Path::new("/nonexistent"), "Skin"), None);
    }
}
