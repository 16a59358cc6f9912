//! Content hashing for source files and copied assets

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

const PREFIX: &str = "sha256:";

/// A SHA-256 digest of a file's bytes.
///
/// Manifests record the hash of the source they were committed from, and the
/// copy step compares hashes to tell a harmless re-copy of the same bytes
/// apart from a clobbering write over an unrelated file.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash an in-memory buffer
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Hash a file by streaming its contents
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(Self(hasher.finalize().into()))
    }

    /// Lowercase hex digest
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Hex digest with the algorithm prefix, as written into manifests
    pub fn to_prefixed_hex(&self) -> String {
        format!("{}{}", PREFIX, self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bytes_same_hash() {
        assert_eq!(
            ContentHash::from_bytes(b"grass"),
            ContentHash::from_bytes(b"grass")
        );
        assert_ne!(
            ContentHash::from_bytes(b"grass"),
            ContentHash::from_bytes(b"stone")
        );
    }

    #[test]
    fn test_file_hash_matches_buffer_hash() {
        let path = std::env::temp_dir().join(format!("kiln_hash_{}.bin", std::process::id()));
        std::fs::write(&path, b"texture bytes").unwrap();

        let from_file = ContentHash::from_file(&path).unwrap();
        assert_eq!(from_file, ContentHash::from_bytes(b"texture bytes"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_prefixed_hex_format() {
        let prefixed = ContentHash::from_bytes(b"manifest").to_prefixed_hex();
        assert!(prefixed.starts_with("sha256:"));
        assert_eq!(prefixed.len(), "sha256:".len() + 64);
    }
}
