//! File operations the commit step performs

use crate::types::{manifest_to_string, ManifestRecord};
use kiln_core::{ContentHash, KilnError, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Blocking file primitives used while building and committing an import
pub trait AssetFs {
    /// Whether `path` names a readable file
    fn exists(&self, path: &Path) -> bool;

    /// Copy `src` to `dst`, creating parent directories.
    ///
    /// Without `overwrite`, an existing destination is only accepted when it
    /// already holds the same bytes as `src`.
    fn copy(&self, src: &Path, dst: &Path, overwrite: bool) -> Result<()>;

    /// Write a manifest sidecar to `path`
    fn write_manifest(&self, record: &ManifestRecord, path: &Path) -> Result<()>;

    /// Delete a file; a file that is already gone is not an error
    fn remove(&self, path: &Path) -> Result<()>;
}

/// [`AssetFs`] over the local disk
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl AssetFs for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn copy(&self, src: &Path, dst: &Path, overwrite: bool) -> Result<()> {
        if !src.is_file() {
            return Err(KilnError::AssetError(format!(
                "Source file not found: {}",
                src.display()
            )));
        }

        if dst.exists() {
            if same_file(src, dst) {
                return Ok(());
            }
            if !overwrite {
                let src_hash = ContentHash::from_file(src)?;
                let dst_hash = ContentHash::from_file(dst)?;
                if src_hash == dst_hash {
                    debug!("{} already holds identical content", dst.display());
                    return Ok(());
                }
                return Err(KilnError::AssetError(format!(
                    "Refusing to overwrite existing file {}",
                    dst.display()
                )));
            }
        }

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
        debug!("Copied {} -> {}", src.display(), dst.display());
        Ok(())
    }

    fn write_manifest(&self, record: &ManifestRecord, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, manifest_to_string(record)?)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        if path.is_file() {
            fs::remove_file(path)?;
            debug!("Removed {}", path.display());
        }
        Ok(())
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{read_manifest, RecordDetails};
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kiln_fs_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_copy_creates_parent_dirs() {
        let dir = temp_dir();
        let src = dir.join("grass.png");
        fs::write(&src, b"pixels").unwrap();

        let dst = dir.join("data/Terrain/Images/grass.png");
        LocalFs.copy(&src, &dst, false).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"pixels");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_copy_refuses_to_clobber_different_content() {
        let dir = temp_dir();
        let src = dir.join("a.png");
        let dst = dir.join("b.png");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"unrelated").unwrap();

        assert!(LocalFs.copy(&src, &dst, false).is_err());
        assert_eq!(fs::read(&dst).unwrap(), b"unrelated");

        LocalFs.copy(&src, &dst, true).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"new");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_copy_accepts_identical_destination() {
        let dir = temp_dir();
        let src = dir.join("a.ogg");
        let dst = dir.join("b.ogg");
        fs::write(&src, b"same").unwrap();
        fs::write(&dst, b"same").unwrap();

        LocalFs.copy(&src, &dst, false).unwrap();
        LocalFs.copy(&src, &src, false).unwrap();

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_manifest_readable() {
        let dir = temp_dir();
        let path = dir.join("Scripts/main.asset.toml");
        let record = ManifestRecord {
            name: "main".to_string(),
            module: "Game".to_string(),
            file: Some("main.rhai".to_string()),
            source_hash: None,
            details: RecordDetails::Script,
        };

        LocalFs.write_manifest(&record, &path).unwrap();
        assert!(LocalFs.exists(&path));
        assert_eq!(read_manifest(&path).unwrap(), record);

        LocalFs.remove(&path).unwrap();
        assert!(!LocalFs.exists(&path));
        LocalFs.remove(&path).unwrap();

        fs::remove_dir_all(&dir).ok();
    }
}
