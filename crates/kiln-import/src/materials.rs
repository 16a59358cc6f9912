//! Texture role matching for materials and images

use crate::item::{ImageFields, ItemFields, MapSource, MaterialFields};
use crate::profile::{ImageSettings, ImportProfile};
use crate::tree::Batch;
use kiln_asset::{AssetKind, TextureRole};
use kiln_core::ItemId;
use std::path::Path;

/// Role whose suffix table matches the end of `name`.
///
/// Matching is case-sensitive and tries roles in precedence order; the first
/// role with a matching suffix wins.
pub fn role_for_name(name: &str, images: &ImageSettings) -> Option<TextureRole> {
    TextureRole::PRECEDENCE.into_iter().find(|role| {
        images
            .suffixes_for(*role)
            .iter()
            .any(|suffix| !suffix.is_empty() && name.ends_with(suffix.as_str()))
    })
}

/// `name` without the suffix that gave it its role, if any
pub fn strip_role_suffix<'a>(name: &'a str, images: &ImageSettings) -> &'a str {
    let Some(role) = role_for_name(name, images) else {
        return name;
    };
    images
        .suffixes_for(role)
        .iter()
        .filter(|suffix| !suffix.is_empty())
        .find_map(|suffix| name.strip_suffix(suffix.as_str()))
        .unwrap_or(name)
}

/// Role of an image item, falling back to the profile's default image type
pub fn image_fields(name: &str, images: &ImageSettings) -> ImageFields {
    ImageFields {
        role: role_for_name(name, images).unwrap_or(images.image_type),
    }
}

/// Work out which images fill which slots of a material.
///
/// Candidates, in order: the material's own source file, its image children,
/// an image parent, and image siblings whose name without role suffix is the
/// material's name. The first candidate for a role keeps the slot. The
/// composite slot stays empty unless the profile creates composites.
pub fn assign_texture_roles(batch: &Batch, material: ItemId, profile: &ImportProfile) -> MaterialFields {
    let images = &profile.images;
    let wanted =
        |role: TextureRole| role != TextureRole::Composite || profile.materials.create_composites;
    let mut fields = MaterialFields::default();
    let Some(item) = batch.get(material) else {
        return fields;
    };

    if let Some(source) = item.source() {
        let role = role_for_name(&file_stem(source), images).unwrap_or(TextureRole::Diffuse);
        if wanted(role) {
            fields.maps.entry(role).or_insert(MapSource::OwnSource);
        }
    }

    let mut candidates: Vec<ItemId> = item.children().to_vec();
    if let Some(parent) = item.parent() {
        candidates.push(parent);
        if let Some(parent_item) = batch.get(parent) {
            candidates.extend(parent_item.children().iter().copied().filter(|sibling| {
                *sibling != material
                    && batch
                        .get(*sibling)
                        .map(|s| strip_role_suffix(&s.asset_name, images) == item.asset_name)
                        .unwrap_or(false)
            }));
        }
    }

    for candidate in candidates {
        let Some(image) = batch.get(candidate) else {
            continue;
        };
        if image.kind != AssetKind::Image {
            continue;
        }
        let role = match &image.fields {
            ItemFields::Image(f) => f.role,
            _ => image_fields(&image.asset_name, images).role,
        };
        if wanted(role) {
            fields.maps.entry(role).or_insert(MapSource::Item(candidate));
        }
    }

    fields
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}
