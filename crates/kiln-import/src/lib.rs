//! Kiln Import - The import tree engine
//!
//! Dropped files are classified by extension, expanded into trees of derived
//! assets (a model yields animations and materials, a material gathers its
//! texture maps), validated against the batch, the registry and the disk,
//! and finally committed into a module as copied files plus manifests.
//!
//! [`ImportSession`] ties the pieces together and exposes the operator
//! intents; the builder, validator and commit executor can also be used on
//! their own over a [`Batch`].

mod archive;
mod builder;
mod classify;
mod commit;
mod config;
mod introspect;
mod item;
mod materials;
mod picker;
mod profile;
mod session;
mod tree;
mod validate;

pub use archive::{ArchiveExtractor, ZipExtractor};
pub use builder::{find_adjacent_image, TreeBuilder};
pub use classify::{classify, derive_asset_name, sanitize_name, FileClass, ADJACENT_IMAGE_EXTENSIONS};
pub use commit::{CommitExecutor, CommitFailure, CommitReport};
pub use config::{ImportSection, KilnConfig, KilnConfigFile};
pub use introspect::{ClipInfo, GltfIntrospector, MaterialRef, ShapeIntrospector, ShapeSummary};
pub use item::{
    AnimationFields, ImageFields, ImportItem, ItemFields, ItemStatus, MapSource, MaterialFields,
    ModelFields, Resolution, StatusType,
};
pub use materials::{assign_texture_roles, image_fields, role_for_name, strip_role_suffix};
pub use picker::{DirectoryPicker, FilePicker};
pub use profile::{
    AnimationSettings, CollisionSettings, CollisionType, GeneralSettings, ImageSettings,
    ImportProfile, LodType, MaterialSettings, MeshSettings, ProfileLibrary, SoundSettings, UpAxis,
    DEFAULT_PROFILE,
};
pub use session::{ImportSession, RefreshReport, RejectedFile, ResolveIntent, MAX_PASSES};
pub use tree::Batch;
pub use validate::{Issue, ValidationReport, Validator};
