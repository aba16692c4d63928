//! On-disk artifact caching
//!
//! Two parallel stores share the same (package, filename) layout: the raw
//! cache holds verbatim origin bytes, the modified store holds patched
//! wheels plus markers for wheels that needed no patching. Both are
//! append-only; nothing here expires or evicts entries.

pub mod locks;
pub mod store;

pub use locks::KeyedLocks;
pub use store::{ArtifactStore, StoredArtifact};

use crate::error::{MirrorError, MirrorResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// SHA256 of a file's contents as lowercase hex
pub fn sha256_file(path: &Path) -> MirrorResult<String> {
    let mut file = File::open(path)
        .map_err(|e| MirrorError::io(format!("opening {}", path.display()), e))?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| MirrorError::io(format!("hashing {}", path.display()), e))?;

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.0 GB");
    }

    #[test]
    fn sha256_known_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(
            sha256_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_differs_by_content() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, b"content 1").unwrap();
        std::fs::write(&b, b"content 2").unwrap();

        assert_ne!(sha256_file(&a).unwrap(), sha256_file(&b).unwrap());
    }
}
