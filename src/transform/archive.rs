//! Wheel unpack, patch and repack

use crate::cache::ArtifactStore;
use crate::error::{MirrorError, MirrorResult};
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::rules::{injected_block, is_package_dir, INIT_FILE};

/// What happened to a wheel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// A patched copy was written to the modified store
    Patched {
        path: PathBuf,
        /// Archive paths of the initializers that received the payload
        files: Vec<String>,
    },
    /// No package directory or no initializer in it
    Unchanged,
}

/// Patch a cached wheel of `package`, storing the result under `filename`
///
/// The wheel is unpacked into a scratch directory below `scratch_root`,
/// which is removed again on every exit path. Only the first top-level
/// directory (by name) matching the package is scanned; bundled
/// dependencies are left alone. When something was patched, the wheel is
/// rebuilt into `store` with every entry of the source archive.
pub fn patch_wheel(
    source: &Path,
    package: &str,
    filename: &str,
    store: &ArtifactStore,
    scratch_root: &Path,
) -> MirrorResult<PatchOutcome> {
    let scratch = tempfile::Builder::new()
        .prefix("wheelmirror-")
        .tempdir_in(scratch_root)
        .map_err(|e| {
            MirrorError::io(
                format!("creating scratch dir in {}", scratch_root.display()),
                e,
            )
        })?;

    let mut archive = open_archive(source)?;
    archive
        .extract(scratch.path())
        .map_err(|e| unpack_error(source, e))?;

    let Some(package_dir) = find_package_dir(scratch.path(), package)? else {
        debug!("No {} directory in {}", package, source.display());
        return Ok(PatchOutcome::Unchanged);
    };

    let files = append_payload(scratch.path(), &package_dir)?;
    if files.is_empty() {
        debug!("No {} under {}", INIT_FILE, package_dir.display());
        return Ok(PatchOutcome::Unchanged);
    }

    let patched: BTreeSet<&str> = files.iter().map(String::as_str).collect();
    let repack = Repack {
        source,
        root: scratch.path(),
        patched: &patched,
    };
    let path = store.write_with(package, filename, |file| repack.run(&mut archive, file))?;
    info!("Patched {} file(s) into {}", files.len(), path.display());

    Ok(PatchOutcome::Patched { path, files })
}

fn open_archive(source: &Path) -> MirrorResult<ZipArchive<File>> {
    let file = File::open(source)
        .map_err(|e| MirrorError::io(format!("opening {}", source.display()), e))?;

    ZipArchive::new(file).map_err(|e| unpack_error(source, e))
}

/// Decoding problems mean a corrupt archive; other IO failures are local
fn unpack_error(source: &Path, err: ZipError) -> MirrorError {
    match err {
        ZipError::Io(e)
            if !matches!(
                e.kind(),
                io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
            ) =>
        {
            MirrorError::io(format!("unpacking {}", source.display()), e)
        }
        other => MirrorError::ArchiveCorrupt {
            path: source.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn find_package_dir(root: &Path, package: &str) -> MirrorResult<Option<PathBuf>> {
    let mut names = Vec::new();
    let entries = fs::read_dir(root)
        .map_err(|e| MirrorError::io(format!("reading {}", root.display()), e))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| MirrorError::io(format!("reading entry in {}", root.display()), e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| MirrorError::io(format!("inspecting {}", entry.path().display()), e))?
            .is_dir();
        if is_dir {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    names.sort();
    Ok(names
        .into_iter()
        .find(|name| is_package_dir(name, package))
        .map(|name| root.join(name)))
}

/// Append the payload to every initializer below `package_dir`
///
/// Returns the patched files as archive paths relative to `root`.
fn append_payload(root: &Path, package_dir: &Path) -> MirrorResult<Vec<String>> {
    let block = injected_block();
    let mut patched = Vec::new();

    for entry in WalkDir::new(package_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| MirrorError::io("walking package directory", e.into()))?;
        if !entry.file_type().is_file() || entry.file_name() != INIT_FILE {
            continue;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(entry.path())
            .map_err(|e| MirrorError::io(format!("opening {}", entry.path().display()), e))?;
        file.write_all(block.as_bytes()).map_err(|e| {
            MirrorError::io(format!("appending to {}", entry.path().display()), e)
        })?;

        patched.push(archive_name(root, entry.path())?);
    }

    Ok(patched)
}

/// Rebuilds a wheel from its source archive and the patched scratch tree
///
/// Entries are written in name order. Patched initializers are recompressed
/// from the scratch tree. Regular files are copied raw, keeping their
/// compressed bytes, mode and timestamp. Directories and symlinks are
/// recreated with their own entry types.
struct Repack<'a> {
    source: &'a Path,
    root: &'a Path,
    patched: &'a BTreeSet<&'a str>,
}

impl Repack<'_> {
    fn run(&self, archive: &mut ZipArchive<File>, out: &mut File) -> MirrorResult<()> {
        let mut order = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| unpack_error(self.source, e))?;
            order.push((entry.name().to_string(), index));
        }
        order.sort();

        let mut writer = ZipWriter::new(out);
        for (name, index) in order {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| unpack_error(self.source, e))?;

            if entry.is_dir() {
                writer
                    .add_directory(name.as_str(), entry_options(&entry))
                    .map_err(|e| self.write_error(e))?;
            } else if entry.is_symlink() {
                let options = entry_options(&entry);
                drop(entry);
                let target = self.symlink_target(archive, index)?;
                writer
                    .add_symlink(name.as_str(), target, options)
                    .map_err(|e| self.write_error(e))?;
            } else if let Some(relative) = self.patched_path(&entry) {
                writer
                    .start_file(name.as_str(), entry_options(&entry))
                    .map_err(|e| self.write_error(e))?;
                let patched = self.root.join(&relative);
                let mut file = File::open(&patched)
                    .map_err(|e| MirrorError::io(format!("opening {}", patched.display()), e))?;
                io::copy(&mut file, &mut writer)
                    .map_err(|e| MirrorError::io(format!("compressing {}", relative), e))?;
            } else {
                writer
                    .raw_copy_file(entry)
                    .map_err(|e| self.write_error(e))?;
            }
        }

        writer.finish().map_err(|e| self.write_error(e))?;
        Ok(())
    }

    /// Scratch-relative path of the entry, if its content was patched
    fn patched_path(&self, entry: &ZipFile) -> Option<String> {
        let name = slash_path(&entry.enclosed_name()?);
        self.patched.contains(name.as_str()).then_some(name)
    }

    fn symlink_target(
        &self,
        archive: &mut ZipArchive<File>,
        index: usize,
    ) -> MirrorResult<String> {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| unpack_error(self.source, e))?;
        let mut target = String::new();
        entry
            .read_to_string(&mut target)
            .map_err(|e| unpack_error(self.source, ZipError::Io(e)))?;
        Ok(target)
    }

    fn write_error(&self, err: ZipError) -> MirrorError {
        match err {
            ZipError::Io(e) => MirrorError::io(format!("repacking {}", self.source.display()), e),
            other => MirrorError::ArchiveWrite {
                path: self.source.to_path_buf(),
                reason: other.to_string(),
            },
        }
    }
}

/// Options carrying over an entry's mode and timestamp
///
/// Rewritten entries are always deflated.
fn entry_options(entry: &ZipFile) -> SimpleFileOptions {
    let mut options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    if let Some(mode) = entry.unix_mode() {
        options = options.unix_permissions(mode);
    }
    if let Some(time) = entry.last_modified().filter(|t| t.is_valid()) {
        options = options.last_modified_time(time);
    }
    options
}

fn archive_name(root: &Path, path: &Path) -> MirrorResult<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        MirrorError::Internal(format!("{} is outside {}", path.display(), root.display()))
    })?;

    Ok(slash_path(relative))
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
