//! Import session: one batch, its active module and profile, and the
//! operator intents that drive them

use crate::archive::{ArchiveExtractor, ZipExtractor};
use crate::builder::TreeBuilder;
use crate::classify::{classify, sanitize_name, FileClass};
use crate::commit::{CommitExecutor, CommitReport};
use crate::introspect::{GltfIntrospector, ShapeIntrospector};
use crate::item::{ImportItem, ItemFields, Resolution, StatusType};
use crate::materials::{assign_texture_roles, image_fields};
use crate::picker::FilePicker;
use crate::profile::{ImportProfile, ProfileLibrary, DEFAULT_PROFILE};
use crate::tree::Batch;
use crate::validate::{ValidationReport, Validator};
use kiln_asset::{AssetFs, AssetKind, AssetRegistry, LocalFs};
use kiln_core::{ItemId, KilnError, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound on expand/validate passes in one refresh
pub const MAX_PASSES: usize = 10;

/// What the operator decided for a flagged item
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveIntent {
    /// Keep the registry's asset and drop this one
    UseOriginal,
    /// Commit this item over the registry's asset
    Override,
    Rename(String),
    /// Point the item at a new source file
    FindMissingFile(PathBuf),
}

/// A dropped file that did not make it into the batch
#[derive(Debug, Clone)]
pub struct RejectedFile {
    pub name: String,
    pub reason: String,
}

/// Outcome of a refresh
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub passes: usize,
    /// Items created by expansion
    pub created: usize,
    /// Missing files replaced through the file picker
    pub replaced: usize,
    pub rejected: Vec<RejectedFile>,
    pub validation: ValidationReport,
}

impl RefreshReport {
    pub fn has_issues(&self) -> bool {
        self.validation.has_issues() || !self.rejected.is_empty()
    }
}

/// Owns the batch being imported and everything needed to build, validate
/// and commit it. One session handles one batch at a time.
pub struct ImportSession<R: AssetRegistry> {
    batch: Batch,
    registry: R,
    library: ProfileLibrary,
    profile: ImportProfile,
    module: String,
    reimport: bool,
    data_root: PathBuf,
    introspector: Box<dyn ShapeIntrospector>,
    extractor: Box<dyn ArchiveExtractor>,
    fs: Box<dyn AssetFs>,
    picker: Option<Box<dyn FilePicker>>,
    staging: Vec<PathBuf>,
    rejected: Vec<RejectedFile>,
}

impl<R: AssetRegistry> ImportSession<R> {
    /// A session on the local disk, importing into `module` with the
    /// library's default profile
    pub fn new(registry: R, library: ProfileLibrary, data_root: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        let profile = library.get(DEFAULT_PROFILE).cloned().unwrap_or_default();
        Self {
            batch: Batch::new(),
            registry,
            library,
            profile,
            module: module.into(),
            reimport: false,
            data_root: data_root.into(),
            introspector: Box::new(GltfIntrospector),
            extractor: Box::new(ZipExtractor),
            fs: Box::new(LocalFs),
            picker: None,
            staging: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn with_introspector(mut self, introspector: impl ShapeIntrospector + 'static) -> Self {
        self.introspector = Box::new(introspector);
        self
    }

    pub fn with_extractor(mut self, extractor: impl ArchiveExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_fs(mut self, fs: impl AssetFs + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn with_picker(mut self, picker: impl FilePicker + 'static) -> Self {
        self.picker = Some(Box::new(picker));
        self
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn item(&self, id: ItemId) -> Result<&ImportItem> {
        self.batch.item(id)
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn profile(&self) -> &ImportProfile {
        &self.profile
    }

    pub fn library(&self) -> &ProfileLibrary {
        &self.library
    }

    /// Profile edits land here; reselect the profile to apply them
    pub fn library_mut(&mut self) -> &mut ProfileLibrary {
        &mut self.library
    }

    pub fn active_module(&self) -> &str {
        &self.module
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn is_reimport(&self) -> bool {
        self.reimport
    }

    /// Treat the batch as a re-import of assets already in the registry
    pub fn set_reimport(&mut self, reimport: bool) {
        self.reimport = reimport;
    }

    /// Discard the batch and any extracted archives
    pub fn begin_batch(&mut self) {
        self.batch.clear();
        self.rejected.clear();
        self.clean_staging();
    }

    /// Start a drop: the previous batch is discarded
    pub fn begin_drop(&mut self) {
        self.begin_batch();
    }

    /// Add a dropped file to the batch, returning the roots it produced.
    ///
    /// Archives are extracted and each entry is dropped in turn; entries that
    /// fail are recorded for the next refresh report rather than failing the
    /// archive. Unknown files produce nothing.
    pub fn drop_file(&mut self, path: &Path) -> Result<Vec<ItemId>> {
        match classify(path) {
            FileClass::Archive => self.drop_archive(path),
            FileClass::Unknown => {
                debug!("Ignoring {}", path.display());
                Ok(Vec::new())
            }
            FileClass::Asset(_) => {
                let builder = TreeBuilder::new(&self.profile, self.introspector.as_ref(), self.fs.as_ref());
                let root = builder.add_root(&mut self.batch, path, &self.module)?;
                Ok(root.into_iter().collect())
            }
        }
    }

    fn drop_archive(&mut self, archive: &Path) -> Result<Vec<ItemId>> {
        let staging = std::env::temp_dir().join(format!("kiln_staging_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&staging)?;
        self.staging.push(staging.clone());

        let mut entries = self.extractor.extract(archive, &staging)?;
        entries.sort();
        info!("Expanding {} entries from {}", entries.len(), archive.display());

        let mut roots = Vec::new();
        for entry in entries {
            match self.drop_file(&entry) {
                Ok(ids) => roots.extend(ids),
                Err(e) => {
                    warn!("Skipping {} from {}: {}", entry.display(), archive.display(), e);
                    self.rejected.push(RejectedFile {
                        name: entry.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(roots)
    }

    /// Finish a drop and bring the batch up to date
    pub fn end_drop(&mut self) -> RefreshReport {
        self.refresh()
    }

    /// Retarget every item that was not explicitly moved elsewhere
    pub fn set_active_module(&mut self, module: impl Into<String>) -> RefreshReport {
        self.module = module.into();
        for id in self.batch.preorder() {
            if let Some(item) = self.batch.get_mut(id) {
                if !item.module_override {
                    item.module_name = self.module.clone();
                }
            }
        }
        self.refresh()
    }

    /// Move an item and its subtree into another module
    pub fn move_item(&mut self, id: ItemId, module: &str) -> Result<RefreshReport> {
        self.batch.item(id)?;
        let moved = module != self.module;
        for member in self.batch.subtree(id) {
            if let Some(item) = self.batch.get_mut(member) {
                item.module_name = module.to_string();
                item.module_override = moved;
            }
        }
        Ok(self.refresh())
    }

    /// Make a library profile active and rebuild every tree under it.
    ///
    /// Reselecting the current profile after editing it also rebuilds.
    pub fn set_active_profile(&mut self, name: &str) -> Result<RefreshReport> {
        let profile = self
            .library
            .get(name)
            .cloned()
            .ok_or_else(|| KilnError::ProfileNotFound(name.to_string()))?;
        info!("Active import profile is now '{}'", profile.name);
        self.profile = profile;

        for root in self.batch.roots().to_vec() {
            self.batch.remove_children(root)?;
            let item = self.batch.item_mut(root)?;
            item.kind = item.classified_kind;
            item.fields = ItemFields::None;
            item.processed = false;
        }
        Ok(self.refresh())
    }

    /// Apply an operator decision to an item, then refresh
    pub fn resolve_item(&mut self, id: ItemId, intent: ResolveIntent) -> Result<RefreshReport> {
        match intent {
            ResolveIntent::UseOriginal => {
                if self.batch.item(id)?.parent().is_none() {
                    debug!("Dropping root {} in favour of the registry asset", id);
                    self.batch.remove(id)?;
                } else {
                    let item = self.batch.item_mut(id)?;
                    item.skip = true;
                    item.resolution = Some(Resolution::UseOriginal);
                }
            }
            ResolveIntent::Override => {
                self.batch.item_mut(id)?.resolution = Some(Resolution::Override);
            }
            ResolveIntent::Rename(name) => {
                let item = self.batch.item_mut(id)?;
                item.rename(sanitize_name(&name));
                item.resolution = None;
                self.update_texture_roles(id)?;
            }
            ResolveIntent::FindMissingFile(path) => {
                if !self.fs.exists(&path) {
                    return Err(KilnError::ImportError(format!(
                        "Replacement file {} does not exist",
                        path.display()
                    )));
                }
                self.replace_source(id, path)?;
            }
        }
        Ok(self.refresh())
    }

    /// Include or exclude an item and its subtree from commit
    pub fn toggle_skip(&mut self, id: ItemId, skip: bool) -> Result<RefreshReport> {
        self.batch.item_mut(id)?.skip = skip;
        Ok(self.refresh())
    }

    /// Expand and validate until expansion creates nothing new.
    ///
    /// With `automatically_prompt_missing_files` set, the file picker is
    /// asked for every missing file on each pass.
    pub fn refresh(&mut self) -> RefreshReport {
        let mut report = RefreshReport {
            rejected: std::mem::take(&mut self.rejected),
            ..Default::default()
        };

        loop {
            report.passes += 1;
            let builder = TreeBuilder::new(&self.profile, self.introspector.as_ref(), self.fs.as_ref());
            let (created, rejected) = builder.expand_all(&mut self.batch);
            report.created += created;
            report.rejected.extend(rejected.into_iter().map(|(name, e)| RejectedFile {
                name,
                reason: e.to_string(),
            }));

            report.validation = self.validate();
            let replaced = if self.profile.general.automatically_prompt_missing_files {
                self.prompt_missing_files()
            } else {
                0
            };
            report.replaced += replaced;

            if created == 0 && replaced == 0 {
                break;
            }
            if report.passes >= MAX_PASSES {
                warn!("Import tree still changing after {} passes", MAX_PASSES);
                report.validation = self.validate();
                break;
            }
        }

        debug!(
            "Refresh: {} pass(es), {} created, {}",
            report.passes,
            report.created,
            report.validation.summary()
        );
        report
    }

    /// Run one validation pass over the batch
    pub fn validate(&mut self) -> ValidationReport {
        Validator::new(&self.registry, self.fs.as_ref(), &self.profile, self.reimport).validate(&mut self.batch)
    }

    /// Ask the file picker for every item missing its file, returning how
    /// many were replaced
    pub fn prompt_missing_files(&mut self) -> usize {
        let Some(picker) = self.picker.as_mut() else {
            return 0;
        };

        let mut picks = Vec::new();
        for id in self.batch.preorder() {
            let Some(item) = self.batch.get(id) else {
                continue;
            };
            if item.status_type != StatusType::MissingFile || self.batch.is_skipped(id) {
                continue;
            }
            if let Some(path) = picker.pick_replacement(item) {
                if self.fs.exists(&path) && item.source() != Some(path.as_path()) {
                    picks.push((id, path));
                }
            }
        }

        let mut replaced = 0;
        for (id, path) in picks {
            match self.replace_source(id, path) {
                Ok(()) => replaced += 1,
                Err(e) => warn!("Could not use replacement for {}: {}", id, e),
            }
        }
        replaced
    }

    /// Commit the batch into the active module
    pub fn commit(&mut self) -> Result<CommitReport> {
        self.refresh();
        let executor = CommitExecutor::new(self.fs.as_ref(), &self.profile, &self.data_root, self.reimport);
        executor.commit(&self.batch, &self.module, &mut self.registry)
    }

    fn replace_source(&mut self, id: ItemId, path: PathBuf) -> Result<()> {
        let item = self.batch.item_mut(id)?;
        debug!("'{}' now sourced from {}", item.asset_name, path.display());
        item.source_path = Some(path);
        if item.classified_kind == AssetKind::Model {
            // New shape file: rebuild the tree below it
            item.kind = item.classified_kind;
            item.fields = ItemFields::None;
            item.processed = false;
            return Ok(());
        }
        self.update_texture_roles(id)
    }

    /// Recompute image roles and material slots around an item
    fn update_texture_roles(&mut self, id: ItemId) -> Result<()> {
        let profile = &self.profile;
        let item = self.batch.item_mut(id)?;
        if item.kind == AssetKind::Image {
            item.fields = ItemFields::Image(image_fields(&item.asset_name, &profile.images));
        }

        let item = self.batch.item(id)?;
        let mut nearby = vec![id];
        nearby.extend(item.children().iter().copied());
        if let Some(parent) = item.parent() {
            nearby.push(parent);
            nearby.extend(self.batch.item(parent)?.children().iter().copied());
        }

        for candidate in nearby {
            let is_material = self
                .batch
                .get(candidate)
                .map(|i| i.kind == AssetKind::Material && i.processed)
                .unwrap_or(false);
            if is_material {
                let fields = assign_texture_roles(&self.batch, candidate, profile);
                self.batch.item_mut(candidate)?.fields = ItemFields::Material(fields);
            }
        }
        Ok(())
    }

    fn clean_staging(&mut self) {
        for dir in self.staging.drain(..) {
            if let Err(e) = fs::remove_dir_all(&dir) {
                debug!("Could not remove staging dir {}: {}", dir.display(), e);
            }
        }
    }
}

impl<R: AssetRegistry> Drop for ImportSession<R> {
    fn drop(&mut self) {
        self.clean_staging();
    }
}
