//! Import items: the nodes of an import tree

use kiln_asset::{AssetKind, TextureRole};
use kiln_core::ItemId;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Validation outcome of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemStatus {
    #[default]
    Clean,
    Warning,
    Error,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemStatus::Clean => "clean",
            ItemStatus::Warning => "warning",
            ItemStatus::Error => "error",
        })
    }
}

/// Why an item is not clean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusType {
    #[default]
    None,
    /// Another item in the same batch has the same name
    DuplicateImportAsset,
    /// The registry already has an asset of that name in the module
    DuplicateAsset,
    /// The source file is gone or was never resolved
    MissingFile,
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusType::None => "none",
            StatusType::DuplicateImportAsset => "duplicate in import",
            StatusType::DuplicateAsset => "duplicate asset",
            StatusType::MissingFile => "missing file",
        })
    }
}

/// Operator decision recorded on an item that collides with the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Keep the registry's asset; the dropped item is not committed
    UseOriginal,
    /// Commit the dropped item and replace the registry entry
    Override,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelFields {
    pub mesh_count: usize,
    /// Clip names kept inside the shape when animations are not split out
    pub embedded_clips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationFields {
    pub start_frame: u32,
    pub end_frame: u32,
    pub pad_rotation: bool,
    pub pad_transforms: bool,
}

/// Where a material's texture slot gets its image from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSource {
    /// The material item's own source file
    OwnSource,
    /// An image item in the same tree
    Item(ItemId),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialFields {
    pub maps: BTreeMap<TextureRole, MapSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFields {
    pub role: TextureRole,
}

/// Kind-specific state filled in by the tree builder
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ItemFields {
    #[default]
    None,
    Model(ModelFields),
    Animation(AnimationFields),
    Material(MaterialFields),
    Image(ImageFields),
}

/// One candidate asset in an import batch
#[derive(Debug, Clone)]
pub struct ImportItem {
    pub(crate) id: ItemId,
    pub kind: AssetKind,
    /// Kind the classifier assigned; restored when the tree is rebuilt
    pub(crate) classified_kind: AssetKind,
    pub source_path: Option<PathBuf>,
    pub asset_name: String,
    pub clean_asset_name: String,
    pub module_name: String,
    /// Set when the item was moved to a module other than the batch's
    pub module_override: bool,
    pub status: ItemStatus,
    pub status_type: StatusType,
    pub status_info: Option<String>,
    pub skip: bool,
    /// Set by validation when the registry already holds this material and
    /// the profile reuses existing materials; recomputed every pass
    pub reuses_existing: bool,
    pub processed: bool,
    /// Created by the builder while expanding a parent
    pub derived: bool,
    /// Content is synthesized at commit; no source file expected
    pub generated: bool,
    pub resolution: Option<Resolution>,
    pub fields: ItemFields,
    pub(crate) parent: Option<ItemId>,
    pub(crate) children: Vec<ItemId>,
    pub(crate) removed: bool,
}

impl ImportItem {
    /// A fresh, unprocessed item. The batch assigns its id on insertion.
    pub fn new(
        kind: AssetKind,
        name: impl Into<String>,
        source_path: Option<PathBuf>,
        module_name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: ItemId::from_index(0),
            kind,
            classified_kind: kind,
            source_path,
            asset_name: name.clone(),
            clean_asset_name: name,
            module_name: module_name.into(),
            module_override: false,
            status: ItemStatus::Clean,
            status_type: StatusType::None,
            status_info: None,
            skip: false,
            reuses_existing: false,
            processed: false,
            derived: false,
            generated: false,
            resolution: None,
            fields: ItemFields::None,
            parent: None,
            children: Vec::new(),
            removed: false,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    pub fn source(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn is_clean(&self) -> bool {
        self.status == ItemStatus::Clean
    }

    /// Whether the item stands for an asset the registry already has
    /// instead of being committed itself
    pub fn defers_to_registry(&self) -> bool {
        self.reuses_existing || self.resolution == Some(Resolution::UseOriginal)
    }

    /// Set a non-clean status with its diagnostic
    pub fn flag(&mut self, status: ItemStatus, status_type: StatusType, info: impl Into<String>) {
        self.status = status;
        self.status_type = status_type;
        self.status_info = Some(info.into());
    }

    /// Back to clean, with the working name reset to the clean name
    pub(crate) fn reset_status(&mut self) {
        self.asset_name = self.clean_asset_name.clone();
        self.status = ItemStatus::Clean;
        self.status_type = StatusType::None;
        self.status_info = None;
        self.reuses_existing = false;
    }

    /// Give the item a new name that validation starts from
    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.asset_name = name.clone();
        self.clean_asset_name = name;
    }
}
