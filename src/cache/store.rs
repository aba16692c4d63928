//! Directory-backed artifact store keyed by (package, filename)
//!
//! Entries live at `<root>/<package>/<filename>`. Writes go to a temp file in
//! the same directory and are renamed into place, so readers only ever see
//! complete files. Entries are never modified or removed once written.

use crate::error::{MirrorError, MirrorResult};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Suffix of the marker recording that an artifact needs no patching
const UNMODIFIED_MARKER: &str = ".unmodified";

/// A stored artifact as reported by [`ArtifactStore::entries`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub package: String,
    pub filename: String,
    pub size: u64,
}

/// One on-disk tree of artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path where the entry for (package, filename) lives
    pub fn path_for(&self, package: &str, filename: &str) -> MirrorResult<PathBuf> {
        validate_component(package)?;
        validate_component(filename)?;
        Ok(self.root.join(package).join(filename))
    }

    /// Path of the stored entry, if it exists
    pub fn get(&self, package: &str, filename: &str) -> MirrorResult<Option<PathBuf>> {
        let path = self.path_for(package, filename)?;
        Ok(path.is_file().then_some(path))
    }

    /// Write an entry atomically
    ///
    /// `fill` receives a temp file in the destination directory. The temp
    /// file is only renamed into place when `fill` succeeds; on any error it
    /// is deleted.
    pub fn write_with<F>(&self, package: &str, filename: &str, fill: F) -> MirrorResult<PathBuf>
    where
        F: FnOnce(&mut File) -> MirrorResult<()>,
    {
        let path = self.path_for(package, filename)?;
        let dir = self.root.join(package);
        fs::create_dir_all(&dir)
            .map_err(|e| MirrorError::io(format!("creating directory {}", dir.display()), e))?;

        let mut temp = NamedTempFile::new_in(&dir)
            .map_err(|e| MirrorError::io(format!("creating temp file in {}", dir.display()), e))?;

        fill(temp.as_file_mut())?;

        temp.as_file_mut()
            .flush()
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| MirrorError::io(format!("flushing {}", path.display()), e))?;

        temp.persist(&path)
            .map_err(|e| MirrorError::io(format!("renaming into {}", path.display()), e.error))?;

        debug!("Stored {}", path.display());
        Ok(path)
    }

    /// Whether the no-patching marker exists for (package, filename)
    pub fn has_unmodified_marker(&self, package: &str, filename: &str) -> MirrorResult<bool> {
        Ok(self.marker_path(package, filename)?.is_file())
    }

    /// Persist the no-patching marker for (package, filename)
    pub fn mark_unmodified(&self, package: &str, filename: &str) -> MirrorResult<()> {
        let marker = format!("{}{}", filename, UNMODIFIED_MARKER);
        self.write_with(package, &marker, |_| Ok(()))?;
        Ok(())
    }

    fn marker_path(&self, package: &str, filename: &str) -> MirrorResult<PathBuf> {
        self.path_for(package, &format!("{}{}", filename, UNMODIFIED_MARKER))
    }

    /// All stored artifacts, sorted by package then filename
    ///
    /// Markers and leftover temp files are skipped.
    pub fn entries(&self) -> MirrorResult<Vec<StoredArtifact>> {
        let mut entries = Vec::new();
        if !self.root.is_dir() {
            return Ok(entries);
        }

        for package_dir in read_dir_sorted(&self.root)? {
            if !package_dir.is_dir() {
                continue;
            }
            let package = file_name_string(&package_dir);

            for file in read_dir_sorted(&package_dir)? {
                let filename = file_name_string(&file);
                if !file.is_file()
                    || filename.ends_with(UNMODIFIED_MARKER)
                    || filename.starts_with(".tmp")
                {
                    continue;
                }
                let size = fs::metadata(&file)
                    .map_err(|e| {
                        MirrorError::io(format!("reading metadata of {}", file.display()), e)
                    })?
                    .len();
                entries.push(StoredArtifact {
                    package: package.clone(),
                    filename,
                    size,
                });
            }
        }

        Ok(entries)
    }
}

/// Reject names that could escape the store root
pub(crate) fn validate_component(name: &str) -> MirrorResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(MirrorError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn read_dir_sorted(dir: &Path) -> MirrorResult<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .map_err(|e| MirrorError::io(format!("reading directory {}", dir.display()), e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MirrorError::io(format!("reading entry in {}", dir.display()), e))?;
    paths.sort();
    Ok(paths)
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
