//! Replacement-file lookup for items whose source is missing

use crate::classify::ADJACENT_IMAGE_EXTENSIONS;
use crate::item::ImportItem;
use kiln_asset::AssetKind;
use log::debug;
use std::path::PathBuf;

/// Supplies a replacement source for an item flagged as missing a file.
///
/// Returning `None` leaves the item as it is.
pub trait FilePicker {
    fn pick_replacement(&mut self, item: &ImportItem) -> Option<PathBuf>;
}

/// Searches a list of directories, in order, for a file that could stand in
/// for the missing source: first the original file name, then the asset name
/// with each image extension for materials and images.
#[derive(Debug, Clone, Default)]
pub struct DirectoryPicker {
    dirs: Vec<PathBuf>,
}

impl DirectoryPicker {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    fn candidates(&self, item: &ImportItem) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(name) = item.source().and_then(|p| p.file_name()) {
            names.push(name.to_string_lossy().into_owned());
        }
        if matches!(item.kind, AssetKind::Material | AssetKind::Image) {
            names.extend(
                ADJACENT_IMAGE_EXTENSIONS
                    .iter()
                    .map(|ext| format!("{}.{}", item.asset_name, ext)),
            );
        }
        names
    }
}

impl FilePicker for DirectoryPicker {
    fn pick_replacement(&mut self, item: &ImportItem) -> Option<PathBuf> {
        let names = self.candidates(item);
        let found = self
            .dirs
            .iter()
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file());
        if let Some(path) = &found {
            debug!("Found replacement {} for '{}'", path.display(), item.asset_name);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_directory_picker_search_order() {
        let root = std::env::temp_dir().join(format!("kiln_picker_{}", uuid::Uuid::new_v4()));
        let first = root.join("first");
        let second = root.join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(second.join("Skin.png"), b"png").unwrap();
        fs::write(second.join("click.ogg"), b"ogg").unwrap();

        let mut picker = DirectoryPicker::new(vec![first, second.clone()]);

        let skin = ImportItem::new(AssetKind::Material, "Skin", None, "Game");
        assert_eq!(picker.pick_replacement(&skin), Some(second.join("Skin.png")));

        let click = ImportItem::new(
            AssetKind::Sound,
            "click",
            Some(PathBuf::from("/gone/click.ogg")),
            "Game",
        );
        assert_eq!(picker.pick_replacement(&click), Some(second.join("click.ogg")));

        let boom = ImportItem::new(AssetKind::Sound, "boom", None, "Game");
        assert_eq!(picker.pick_replacement(&boom), None);

        fs::remove_dir_all(&root).ok();
    }
}
