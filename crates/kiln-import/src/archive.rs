//! Archive expansion for dropped `.zip` files

use kiln_core::{KilnError, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Unpacks an archive so its entries can be dropped one by one
pub trait ArchiveExtractor {
    /// Extract `archive` into `dest` and return the extracted file paths
    fn extract(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>>;
}

/// Zip archive extractor
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
        let file = fs::File::open(archive)?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| {
            KilnError::ArchiveError(format!("Failed to read {}: {}", archive.display(), e))
        })?;

        let mut extracted = Vec::new();
        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .map_err(|e| KilnError::ArchiveError(format!("Bad zip entry {}: {}", i, e)))?;
            // Entries escaping the destination are skipped
            let Some(relative) = entry.enclosed_name() else {
                continue;
            };
            if is_ignored(&relative) {
                continue;
            }

            let out_path = dest.join(relative);
            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
                continue;
            }
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut out_file = fs::File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out_file)?;
            extracted.push(out_path);
        }

        debug!(
            "Extracted {} file(s) from {} into {}",
            extracted.len(),
            archive.display(),
            dest.display()
        );
        Ok(extracted)
    }
}

fn is_ignored(path: &Path) -> bool {
    path.components().any(|component| {
        let part = component.as_os_str().to_string_lossy();
        part.eq_ignore_ascii_case("__MACOSX") || part == ".git" || part == ".DS_Store"
    })
}
