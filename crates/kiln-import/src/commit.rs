//! Commit of a validated batch into the registry

use crate::item::{ImportItem, ItemFields, ItemStatus, MapSource, Resolution};
use crate::profile::ImportProfile;
use crate::tree::Batch;
use kiln_asset::{
    AnimationRecord, AssetFs, AssetId, AssetKind, AssetRegistry, CollisionRecord, ImageRecord,
    ManifestRecord, MaterialRecord, ModelRecord, RecordDetails, SoundRecord, TextureRef,
    MANIFEST_SUFFIX,
};
use kiln_core::{ContentHash, ItemId, KilnError, Result};
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// An item that failed while being committed
#[derive(Debug, Clone)]
pub struct CommitFailure {
    pub item: ItemId,
    pub asset_name: String,
    pub message: String,
}

/// Outcome of a commit
#[derive(Debug, Default)]
pub struct CommitReport {
    pub committed: Vec<AssetId>,
    /// Names of items left out because they were skipped or flagged
    pub excluded: Vec<String>,
    pub errors: Vec<CommitFailure>,
}

impl CommitReport {
    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} committed, {} excluded, {} failed",
            self.committed.len(),
            self.excluded.len(),
            self.errors.len()
        )
    }
}

/// Writes accepted items into `<data_root>/<module>/<KindDir>/`
pub struct CommitExecutor<'a> {
    fs: &'a dyn AssetFs,
    profile: &'a ImportProfile,
    data_root: &'a Path,
    reimport: bool,
}

impl<'a> CommitExecutor<'a> {
    pub fn new(fs: &'a dyn AssetFs, profile: &'a ImportProfile, data_root: &'a Path, reimport: bool) -> Self {
        Self {
            fs,
            profile,
            data_root,
            reimport,
        }
    }

    /// Directory an item's files and manifest go into
    pub fn target_dir(&self, item: &ImportItem) -> PathBuf {
        self.data_root
            .join(&item.module_name)
            .join(item.kind.dir_name())
    }

    /// Path of an item's manifest sidecar
    pub fn manifest_path(&self, item: &ImportItem) -> PathBuf {
        self.target_dir(item)
            .join(format!("{}{}", item.asset_name, MANIFEST_SUFFIX))
    }

    /// Commit every root of the batch not marked skip.
    ///
    /// Fails without side effects when a target module is not declared or
    /// when the profile refuses imports with errors. Otherwise per-item
    /// failures are recorded in the report and the walk continues with the
    /// next sibling.
    pub fn commit(
        &self,
        batch: &Batch,
        target_module: &str,
        registry: &mut dyn AssetRegistry,
    ) -> Result<CommitReport> {
        let order = batch.preorder();
        let mut modules: BTreeSet<&str> = BTreeSet::new();
        modules.insert(target_module);
        for id in &order {
            if let Some(item) = batch.get(*id) {
                if !batch.is_skipped(*id) {
                    modules.insert(item.module_name.as_str());
                }
            }
        }
        if let Some(missing) = modules.iter().find(|m| !registry.module_exists(m)) {
            return Err(KilnError::ModuleNotFound(missing.to_string()));
        }

        if self.profile.general.prevent_import_with_errors {
            let errors = order
                .iter()
                .filter(|id| !batch.is_skipped(**id))
                .filter_map(|id| batch.get(*id))
                .filter(|item| item.status == ItemStatus::Error)
                .count();
            if errors > 0 {
                return Err(KilnError::CommitBlocked(format!(
                    "{} item(s) have errors and the active profile prevents importing with errors",
                    errors
                )));
            }
        }

        let mut report = CommitReport::default();
        let mut taken = HashSet::new();
        for root in batch.roots() {
            self.commit_subtree(batch, *root, registry, &mut taken, &mut report);
        }

        info!("Commit into '{}': {}", target_module, report.summary());
        Ok(report)
    }

    fn commit_subtree(
        &self,
        batch: &Batch,
        id: ItemId,
        registry: &mut dyn AssetRegistry,
        taken: &mut HashSet<(String, String)>,
        report: &mut CommitReport,
    ) {
        let Some(item) = batch.get(id) else {
            return;
        };

        if item.skip || item.reuses_existing || item.status == ItemStatus::Error {
            debug!("Excluding '{}' and its children", item.asset_name);
            self.exclude_subtree(batch, id, report);
            return;
        }

        if item.status == ItemStatus::Warning {
            debug!("Not committing flagged item '{}'", item.asset_name);
            report.excluded.push(item.asset_name.clone());
            for child in item.children() {
                // Clips split out of this shape have nothing to point at
                let depends = batch
                    .get(*child)
                    .is_some_and(|c| self.shape_of(batch, c).is_some());
                if depends {
                    self.exclude_subtree(batch, *child, report);
                } else {
                    self.commit_subtree(batch, *child, registry, taken, report);
                }
            }
            return;
        }

        match self.commit_item(batch, item, registry, taken) {
            Ok(asset) => report.committed.push(asset),
            Err(e) => {
                warn!("Failed to commit '{}': {}", item.asset_name, e);
                report.errors.push(CommitFailure {
                    item: id,
                    asset_name: item.asset_name.clone(),
                    message: e.to_string(),
                });
                for child in item.children() {
                    self.exclude_subtree(batch, *child, report);
                }
                return;
            }
        }

        for child in item.children() {
            self.commit_subtree(batch, *child, registry, taken, report);
        }
    }

    fn exclude_subtree(&self, batch: &Batch, id: ItemId, report: &mut CommitReport) {
        report.excluded.extend(
            batch
                .subtree(id)
                .into_iter()
                .filter_map(|i| batch.get(i))
                .map(|i| i.asset_name.clone()),
        );
    }

    fn commit_item(
        &self,
        batch: &Batch,
        item: &ImportItem,
        registry: &mut dyn AssetRegistry,
        taken: &mut HashSet<(String, String)>,
    ) -> Result<AssetId> {
        let module = item.module_name.as_str();
        let key = (module.to_string(), item.asset_name.clone());
        if taken.contains(&key) {
            return Err(KilnError::ImportError(format!(
                "'{}' was already committed into '{}' by another item",
                item.asset_name, module
            )));
        }

        let overriding = item.resolution == Some(Resolution::Override);
        let overwrite = self.reimport || overriding;
        let existing = registry.find_by_name(module, &item.asset_name);
        if existing.is_some() && !overwrite {
            return Err(KilnError::ImportError(format!(
                "Asset {}:{} already exists; re-import or override to replace it",
                module, item.asset_name
            )));
        }

        let target_dir = self.target_dir(item);
        let shape = self.shape_of(batch, item);
        let mut file = None;
        let mut dest = None;
        let mut source_hash = None;
        if let (Some(src), None) = (item.source(), &shape) {
            let file_name = src
                .file_name()
                .ok_or_else(|| KilnError::ImportError(format!("Bad source path {}", src.display())))?;
            let path = target_dir.join(file_name);
            self.fs.copy(src, &path, overwrite)?;
            file = Some(file_name.to_string_lossy().into_owned());
            dest = Some(path);
            source_hash = ContentHash::from_file(src).ok().map(|h| h.to_prefixed_hex());
        }

        let record = ManifestRecord {
            name: item.asset_name.clone(),
            module: module.to_string(),
            file: file.clone(),
            source_hash,
            details: self.details(batch, item, file.as_deref(), shape),
        };
        let manifest_path = self.manifest_path(item);
        self.fs.write_manifest(&record, &manifest_path)?;

        // The replaced asset may live under another kind directory or name
        // another file; whatever the new one did not overwrite goes
        let previous = existing
            .as_ref()
            .map(|id| registry.asset_files(id))
            .unwrap_or_default();
        let moved = previous.first().is_some_and(|old| *old != manifest_path);
        for stale in previous
            .iter()
            .filter(|p| **p != manifest_path && Some(*p) != dest.as_ref())
        {
            self.fs.remove(stale)?;
        }

        let id = match existing {
            Some(id) if self.reimport && !overriding && !moved => {
                registry.refresh_asset(&id)?;
                id
            }
            _ => registry.add_declared_asset(module, &manifest_path)?,
        };
        taken.insert(key);
        info!("Committed {} {} to {}", item.kind, id, manifest_path.display());
        Ok(id)
    }

    /// Shape asset an animation was split out of
    fn shape_of(&self, batch: &Batch, item: &ImportItem) -> Option<AssetId> {
        if item.kind != AssetKind::Animation {
            return None;
        }
        let parent = batch.get(item.parent()?)?;
        (parent.kind == AssetKind::Model && parent.source() == item.source())
            .then(|| AssetId::new(&parent.module_name, &parent.asset_name))
    }

    fn details(&self, batch: &Batch, item: &ImportItem, file: Option<&str>, shape: Option<AssetId>) -> RecordDetails {
        match item.kind {
            AssetKind::Image => {
                let image_type = match &item.fields {
                    ItemFields::Image(f) => f.role,
                    _ => self.profile.images.image_type,
                };
                let (width, height) = item
                    .source()
                    .and_then(|src| image::image_dimensions(src).ok())
                    .map(|(w, h)| (Some(w), Some(h)))
                    .unwrap_or((None, None));
                let images = &self.profile.images;
                RecordDetails::Image(ImageRecord {
                    image_type,
                    width,
                    height,
                    use_mips: images.use_mips,
                    is_hdr: images.is_hdr,
                    scaling: images.scaling,
                    compressed: images.compressed,
                })
            }
            AssetKind::Model => RecordDetails::Model(self.model_record(batch, item)),
            AssetKind::Animation => {
                let animations = &self.profile.animations;
                let (start_frame, end_frame, pad_rotation, pad_transforms) = match &item.fields {
                    ItemFields::Animation(f) => (f.start_frame, f.end_frame, f.pad_rotation, f.pad_transforms),
                    _ => (0, 0, animations.pad_rotation, animations.pad_transforms),
                };
                RecordDetails::Animation(AnimationRecord {
                    start_frame,
                    end_frame,
                    pad_rotation,
                    pad_transforms,
                    shape: shape.map(|s| s.to_string()),
                })
            }
            AssetKind::Material => {
                let mut record = MaterialRecord::default();
                if let ItemFields::Material(fields) = &item.fields {
                    for (role, map) in &fields.maps {
                        let texture = match map {
                            MapSource::OwnSource => file.map(|f| TextureRef::File { file: f.to_string() }),
                            MapSource::Item(image) => batch.get(*image).map(|image| TextureRef::Asset {
                                asset: AssetId::new(&image.module_name, &image.asset_name).to_string(),
                            }),
                        };
                        if let Some(texture) = texture {
                            record.maps.insert(role.as_str().to_string(), texture);
                        }
                    }
                }
                RecordDetails::Material(record)
            }
            AssetKind::Sound => {
                let sounds = &self.profile.sounds;
                RecordDetails::Sound(SoundRecord {
                    volume: sounds.volume_adjust,
                    pitch: sounds.pitch_adjust,
                    compressed: sounds.compressed,
                })
            }
            AssetKind::Script => RecordDetails::Script,
            AssetKind::Gui => RecordDetails::Gui,
        }
    }

    fn model_record(&self, batch: &Batch, item: &ImportItem) -> ModelRecord {
        let mesh = &self.profile.mesh;
        let collision = &self.profile.collision;
        let (mesh_count, embedded_clips) = match &item.fields {
            ItemFields::Model(f) => (
                u32::try_from(f.mesh_count).unwrap_or(u32::MAX),
                f.embedded_clips.clone(),
            ),
            _ => (0, Vec::new()),
        };

        // Only children that commit, or that stand for a registry asset
        let children_of = |kind: AssetKind| -> Vec<String> {
            item.children()
                .iter()
                .filter_map(|c| batch.get(*c))
                .filter(|c| c.kind == kind)
                .filter(|c| c.defers_to_registry() || (c.is_clean() && !c.skip))
                .map(|c| AssetId::new(&c.module_name, &c.asset_name).to_string())
                .collect()
        };

        ModelRecord {
            mesh_count,
            up_axis: mesh.up_axis_override.map(|a| a.as_str().to_string()),
            scale: mesh.scale_override,
            ignore_node_scale: mesh.ignore_node_scale,
            adjust_center: mesh.adjust_center,
            adjust_floor: mesh.adjust_floor,
            collapse_submeshes: mesh.collapse_submeshes,
            lod_type: mesh.lod_type.as_str().to_string(),
            embedded_clips,
            materials: children_of(AssetKind::Material),
            animations: children_of(AssetKind::Animation),
            collision: collision.generate_collisions.then(|| CollisionRecord {
                collision_type: collision.collision_type.as_str().to_string(),
                mesh_prefix: collision.collision_mesh_prefix.clone(),
                los_mesh_prefix: collision
                    .generate_los_collisions
                    .then(|| collision.los_collision_mesh_prefix.clone()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{AnimationFields, ImageFields, MaterialFields, ModelFields, StatusType};
    use kiln_asset::{read_manifest, LocalFs, ModuleRegistry, TextureRole};
    use std::fs;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kiln_commit_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    struct Fixture {
        dir: PathBuf,
        data: PathBuf,
        registry: ModuleRegistry,
    }

    impl Fixture {
        fn new(module: &str) -> Self {
            let dir = temp_dir();
            let data = dir.join("data");
            let mut registry = ModuleRegistry::load(&data).unwrap();
            registry.create_module(module, None).unwrap();
            Self { dir, data, registry }
        }

        fn source(&self, name: &str, content: &[u8]) -> PathBuf {
            let path = self.dir.join("src").join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            fs::remove_dir_all(&self.dir).ok();
        }
    }

    #[test]
    fn test_commit_sound_writes_file_and_manifest() {
        let mut fx = Fixture::new("Audio");
        let src = fx.source("click.ogg", b"ogg bytes");
        let mut batch = Batch::new();
        batch.insert_root(ImportItem::new(AssetKind::Sound, "click", Some(src), "Audio"));

        let profile = ImportProfile::default();
        let report = CommitExecutor::new(&LocalFs, &profile, &fx.data, false)
            .commit(&batch, "Audio", &mut fx.registry)
            .unwrap();

        assert_eq!(report.committed, vec![AssetId::new("Audio", "click")]);
        let sounds = fx.data.join("Audio").join("Sounds");
        assert_eq!(fs::read(sounds.join("click.ogg")).unwrap(), b"ogg bytes");
        let record = read_manifest(&sounds.join("click.asset.toml")).unwrap();
        assert_eq!(record.file.as_deref(), Some("click.ogg"));
        assert_eq!(
            record.source_hash,
            Some(ContentHash::from_bytes(b"ogg bytes").to_prefixed_hex())
        );
        assert!(matches!(record.details, RecordDetails::Sound(SoundRecord { volume, .. }) if volume == 1.0));
    }

    #[test]
    fn test_missing_module_has_no_side_effects() {
        let mut fx = Fixture::new("Audio");
        let src = fx.source("click.ogg", b"ogg");
        let mut batch = Batch::new();
        batch.insert_root(ImportItem::new(AssetKind::Sound, "click", Some(src), "Ghost"));

        let profile = ImportProfile::default();
        let err = CommitExecutor::new(&LocalFs, &profile, &fx.data, false)
            .commit(&batch, "Ghost", &mut fx.registry)
            .unwrap_err();
        assert!(matches!(err, KilnError::ModuleNotFound(m) if m == "Ghost"));
        assert!(!fx.data.join("Ghost").exists());
    }

    #[test]
    fn test_error_subtree_excluded_warning_children_walked() {
        let mut fx = Fixture::new("Game");
        let model_src = fx.source("hero.dae", b"shape");
        let skin_src = fx.source("Skin.png", b"skin");
        let mut batch = Batch::new();

        let mut model = ImportItem::new(AssetKind::Model, "hero", Some(model_src.clone()), "Game");
        model.flag(ItemStatus::Warning, StatusType::DuplicateImportAsset, "dup");
        let model = batch.insert_root(model);
        let mut walk = ImportItem::new(AssetKind::Animation, "Walk", Some(model_src), "Game");
        walk.fields = ItemFields::Animation(AnimationFields {
            start_frame: 0,
            end_frame: 30,
            pad_rotation: false,
            pad_transforms: false,
        });
        batch.insert_child(model, walk).unwrap();
        batch
            .insert_child(model, ImportItem::new(AssetKind::Material, "Skin", Some(skin_src), "Game"))
            .unwrap();

        let mut broken = ImportItem::new(AssetKind::Model, "broken", None, "Game");
        broken.flag(ItemStatus::Error, StatusType::MissingFile, "gone");
        let broken = batch.insert_root(broken);
        batch
            .insert_child(broken, ImportItem::new(AssetKind::Material, "Rust", None, "Game"))
            .unwrap();

        let profile = ImportProfile::default();
        let report = CommitExecutor::new(&LocalFs, &profile, &fx.data, false)
            .commit(&batch, "Game", &mut fx.registry)
            .unwrap();

        assert_eq!(report.committed, vec![AssetId::new("Game", "Skin")]);
        assert_eq!(report.excluded, vec!["hero", "Walk", "broken", "Rust"]);
        let game = fx.data.join("Game");
        assert!(!game.join("ShapeAnimations").join("Walk.asset.toml").exists());
        assert!(!game.join("Materials").join("Rust.asset.toml").exists());
        assert!(fx.registry.find_by_name("Game", "Walk").is_none());
        assert!(fx.registry.find_by_name("Game", "Skin").is_some());
    }

    #[test]
    fn test_model_lists_only_committed_or_reused_children() {
        let mut fx = Fixture::new("Game");
        let model_src = fx.source("hero.dae", b"shape");
        let mut batch = Batch::new();

        let model = batch.insert_root(ImportItem::new(AssetKind::Model, "hero", Some(model_src.clone()), "Game"));
        batch
            .insert_child(model, ImportItem::new(AssetKind::Animation, "Walk", Some(model_src.clone()), "Game"))
            .unwrap();
        let mut run = ImportItem::new(AssetKind::Animation, "Run", Some(model_src), "Game");
        run.flag(ItemStatus::Warning, StatusType::DuplicateAsset, "taken");
        batch.insert_child(model, run).unwrap();

        let mut skin = ImportItem::new(AssetKind::Material, "Skin", None, "Game");
        skin.flag(ItemStatus::Error, StatusType::MissingFile, "gone");
        batch.insert_child(model, skin).unwrap();
        let mut bark = ImportItem::new(AssetKind::Material, "Bark", Some(fx.source("Bark.png", b"b")), "Game");
        bark.skip = true;
        batch.insert_child(model, bark).unwrap();
        let mut stone = ImportItem::new(AssetKind::Material, "Stone", Some(fx.source("Stone.png", b"s")), "Game");
        stone.reuses_existing = true;
        batch.insert_child(model, stone).unwrap();
        let mut metal = ImportItem::new(AssetKind::Material, "Metal", None, "Game");
        metal.skip = true;
        metal.resolution = Some(Resolution::UseOriginal);
        batch.insert_child(model, metal).unwrap();

        let profile = ImportProfile::default();
        let report = CommitExecutor::new(&LocalFs, &profile, &fx.data, false)
            .commit(&batch, "Game", &mut fx.registry)
            .unwrap();
        assert_eq!(
            report.committed,
            vec![AssetId::new("Game", "hero"), AssetId::new("Game", "Walk")]
        );

        let record = read_manifest(&fx.data.join("Game/Shapes/hero.asset.toml")).unwrap();
        let RecordDetails::Model(shape) = record.details else {
            panic!("expected a model record");
        };
        assert_eq!(shape.animations, vec!["Game:Walk"]);
        assert_eq!(shape.materials, vec!["Game:Stone", "Game:Metal"]);
        assert!(!fx.data.join("Game/Materials/Stone.asset.toml").exists());
    }

    #[test]
    fn test_override_with_new_kind_removes_old_files() {
        let mut fx = Fixture::new("Game");
        let png = fx.source("thing.png", b"pixels");
        let ogg = fx.source("thing.ogg", b"sound");
        let profile = ImportProfile::default();
        let executor = CommitExecutor::new(&LocalFs, &profile, &fx.data, false);

        let mut batch = Batch::new();
        batch.insert_root(ImportItem::new(AssetKind::Image, "thing", Some(png), "Game"));
        executor.commit(&batch, "Game", &mut fx.registry).unwrap();
        let images = fx.data.join("Game").join("Images");
        assert!(images.join("thing.asset.toml").exists());

        let mut batch = Batch::new();
        let id = batch.insert_root(ImportItem::new(AssetKind::Sound, "thing", Some(ogg), "Game"));
        batch.item_mut(id).unwrap().resolution = Some(Resolution::Override);
        let report = executor.commit(&batch, "Game", &mut fx.registry).unwrap();
        assert!(report.is_success());

        assert!(!images.join("thing.asset.toml").exists());
        assert!(!images.join("thing.png").exists());
        let sounds = fx.data.join("Game").join("Sounds");
        assert!(sounds.join("thing.asset.toml").exists());
        assert!(sounds.join("thing.ogg").exists());

        let reloaded = ModuleRegistry::load(&fx.data).unwrap();
        let asset = reloaded.get(&AssetId::new("Game", "thing")).unwrap();
        assert_eq!(asset.kind(), AssetKind::Sound);
        assert_eq!(reloaded.by_module("Game").len(), 1);
    }

    #[test]
    fn test_mesh_count_saturates() {
        let fx = Fixture::new("Game");
        let mut model = ImportItem::new(AssetKind::Model, "huge", None, "Game");
        model.fields = ItemFields::Model(ModelFields {
            mesh_count: usize::MAX,
            embedded_clips: Vec::new(),
        });
        let mut batch = Batch::new();
        let id = batch.insert_root(model);

        let profile = ImportProfile::default();
        let executor = CommitExecutor::new(&LocalFs, &profile, &fx.data, false);
        let record = executor.model_record(&batch, batch.item(id).unwrap());
        assert_eq!(record.mesh_count, u32::MAX);
    }

    #[test]
    fn test_prevent_import_with_errors() {
        let mut fx = Fixture::new("Game");
        let src = fx.source("click.ogg", b"ogg");
        let mut batch = Batch::new();
        batch.insert_root(ImportItem::new(AssetKind::Sound, "click", Some(src), "Game"));
        let mut broken = ImportItem::new(AssetKind::Sound, "boom", None, "Game");
        broken.flag(ItemStatus::Error, StatusType::MissingFile, "gone");
        batch.insert_root(broken);

        let mut profile = ImportProfile::default();
        profile.general.prevent_import_with_errors = true;
        let err = CommitExecutor::new(&LocalFs, &profile, &fx.data, false)
            .commit(&batch, "Game", &mut fx.registry)
            .unwrap_err();
        assert!(matches!(err, KilnError::CommitBlocked(_)));
        assert!(fx.registry.find_by_name("Game", "click").is_none());
    }

    #[test]
    fn test_existing_asset_needs_overwrite() {
        let mut fx = Fixture::new("Audio");
        let src = fx.source("click.ogg", b"v1");
        let mut batch = Batch::new();
        let id = batch.insert_root(ImportItem::new(AssetKind::Sound, "click", Some(src.clone()), "Audio"));
        let profile = ImportProfile::default();
        let executor = CommitExecutor::new(&LocalFs, &profile, &fx.data, false);
        executor.commit(&batch, "Audio", &mut fx.registry).unwrap();

        fs::write(&src, b"v2").unwrap();
        let report = executor.commit(&batch, "Audio", &mut fx.registry).unwrap();
        assert_eq!(report.errors.len(), 1);

        batch.item_mut(id).unwrap().resolution = Some(Resolution::Override);
        let report = executor.commit(&batch, "Audio", &mut fx.registry).unwrap();
        assert!(report.is_success());
        let sounds = fx.data.join("Audio").join("Sounds");
        assert_eq!(fs::read(sounds.join("click.ogg")).unwrap(), b"v2");
        assert_eq!(fx.registry.by_module("Audio").len(), 1);
    }

    #[test]
    fn test_material_record_maps() {
        let mut fx = Fixture::new("Game");
        let skin = fx.source("Skin.png", b"not really a png");
        let normal = fx.source("Skin_n.png", b"normal");
        let mut batch = Batch::new();

        let image = batch.insert_root(ImportItem::new(AssetKind::Image, "Skin_n", Some(normal), "Game"));
        batch.item_mut(image).unwrap().fields = ItemFields::Image(ImageFields {
            role: TextureRole::Normal,
        });
        let mut material = ImportItem::new(AssetKind::Material, "Skin", Some(skin), "Game");
        let mut maps = MaterialFields::default();
        maps.maps.insert(TextureRole::Diffuse, MapSource::OwnSource);
        maps.maps.insert(TextureRole::Normal, MapSource::Item(image));
        material.fields = ItemFields::Material(maps);
        batch.insert_child(image, material).unwrap();

        let profile = ImportProfile::default();
        let report = CommitExecutor::new(&LocalFs, &profile, &fx.data, false)
            .commit(&batch, "Game", &mut fx.registry)
            .unwrap();
        assert_eq!(report.committed_count(), 2);

        let record = read_manifest(&fx.data.join("Game/Materials/Skin.asset.toml")).unwrap();
        let RecordDetails::Material(material) = record.details else {
            panic!("expected a material record");
        };
        assert_eq!(
            material.maps.get("diffuse"),
            Some(&TextureRef::File {
                file: "Skin.png".to_string()
            })
        );
        assert_eq!(
            material.maps.get("normal"),
            Some(&TextureRef::Asset {
                asset: "Game:Skin_n".to_string()
            })
        );

        let image = read_manifest(&fx.data.join("Game/Images/Skin_n.asset.toml")).unwrap();
        assert!(matches!(
            image.details,
            RecordDetails::Image(ImageRecord { image_type: TextureRole::Normal, width: None, .. })
        ));
    }
}
