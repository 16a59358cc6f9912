//! File extension classification

use kiln_asset::AssetKind;
use std::path::Path;

/// What a dropped file is, judging by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Asset(AssetKind),
    Archive,
    Unknown,
}

/// Image extensions looked for next to a model, in priority order
pub const ADJACENT_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "png", "dds", "tif"];

/// Classify a path by its extension, case-insensitively
pub fn classify(path: &Path) -> FileClass {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return FileClass::Unknown,
    };

    match ext.as_str() {
        "png" | "jpg" | "jpeg" | "dds" | "tif" | "tiff" | "bmp" | "tga" | "psd" | "hdr" => {
            FileClass::Asset(AssetKind::Image)
        }
        "dae" | "dts" | "fbx" | "obj" | "gltf" | "glb" | "blend" | "3ds" => {
            FileClass::Asset(AssetKind::Model)
        }
        "dsq" => FileClass::Asset(AssetKind::Animation),
        "ogg" | "wav" | "mp3" | "flac" => FileClass::Asset(AssetKind::Sound),
        "tscript" | "cs" | "rhai" | "lua" => FileClass::Asset(AssetKind::Script),
        "gui" => FileClass::Asset(AssetKind::Gui),
        "zip" => FileClass::Archive,
        _ => FileClass::Unknown,
    }
}

/// Asset name derived from a file name: the stem, with characters that are
/// not valid in asset names replaced by `_`
pub fn derive_asset_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");
    sanitize_name(stem)
}

/// Replace characters outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_kinds() {
        let cases = [
            ("grass.png", FileClass::Asset(AssetKind::Image)),
            ("hero.dae", FileClass::Asset(AssetKind::Model)),
            ("hero_run.dsq", FileClass::Asset(AssetKind::Animation)),
            ("click.ogg", FileClass::Asset(AssetKind::Sound)),
            ("main.tscript", FileClass::Asset(AssetKind::Script)),
            ("menu.gui", FileClass::Asset(AssetKind::Gui)),
            ("pack.zip", FileClass::Archive),
        ];
        for (file, expected) in cases {
            assert_eq!(classify(Path::new(file)), expected, "{}", file);
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(
            classify(Path::new("ROCK.PNG")),
            FileClass::Asset(AssetKind::Image)
        );
        assert_eq!(classify(Path::new("Level.GLB")), FileClass::Asset(AssetKind::Model));
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify(Path::new("notes.txt")), FileClass::Unknown);
        assert_eq!(classify(Path::new("Makefile")), FileClass::Unknown);
    }

    #[test]
    fn test_derive_asset_name() {
        assert_eq!(derive_asset_name(Path::new("/art/grass.png")), "grass");
        assert_eq!(derive_asset_name(Path::new("old chair (2).dae")), "old_chair__2_");
        assert_eq!(sanitize_name("  "), "unnamed");
    }
}
