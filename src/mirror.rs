//! The mirror service
//!
//! Ties together the resolver table, the two artifact stores, the wheel
//! patcher and the origin client. Every method is blocking and is meant to
//! run on tokio's blocking pool; see [`crate::server`].

use crate::audit::AuditLog;
use crate::cache::store::validate_component;
use crate::cache::{sha256_file, ArtifactStore, KeyedLocks};
use crate::config::Config;
use crate::error::{MirrorError, MirrorResult};
use crate::index::{rewrite_index, strip_metadata_suffix, ResolverTable, METADATA_SUFFIX};
use crate::origin::{HttpOrigin, Origin, OriginResponse};
use crate::transform::{patch_wheel, PatchOutcome, RuleSet};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

const HTML: &str = "text/html";
const PLAIN: &str = "text/plain";
const OCTET_STREAM: &str = "application/octet-stream";

/// A response produced by the mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Served {
    fn ok(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: content_type.to_string(),
            body,
        }
    }

    /// Forward an origin response as-is
    fn passthrough(response: OriginResponse, default_content_type: &str) -> Self {
        Self {
            status: response.status,
            content_type: response
                .content_type
                .unwrap_or_else(|| default_content_type.to_string()),
            body: response.body,
        }
    }
}

/// Caching, rewriting, patching mirror of one origin index
pub struct Mirror {
    index_url: String,
    origin: Arc<dyn Origin>,
    resolver: ResolverTable,
    raw: ArtifactStore,
    modified: ArtifactStore,
    rules: RuleSet,
    locks: KeyedLocks,
    audit: AuditLog,
    scratch_root: PathBuf,
}

impl Mirror {
    /// Create a mirror with an explicit origin and audit log
    pub fn new(config: &Config, origin: Arc<dyn Origin>, audit: AuditLog) -> Self {
        Self {
            index_url: config.origin.index_url.trim_end_matches('/').to_string(),
            origin,
            resolver: ResolverTable::new(),
            raw: ArtifactStore::new(&config.storage.cache_dir),
            modified: ArtifactStore::new(&config.storage.modified_dir),
            rules: RuleSet::new(config.transform.packages.iter().cloned()),
            locks: KeyedLocks::new(),
            audit,
            scratch_root: std::env::temp_dir(),
        }
    }

    /// Create a mirror talking HTTP to the configured origin
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config,
            Arc::new(HttpOrigin::new(&config.origin)),
            AuditLog::new(config),
        )
    }

    /// Unpack wheels below `root` instead of the system temp dir
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    pub fn resolver(&self) -> &ResolverTable {
        &self.resolver
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// `GET /simple/`: the origin's top-level index, untouched
    pub fn root_index(&self) -> MirrorResult<Served> {
        let url = format!("{}/", self.index_url);
        let response = self.origin.fetch(&url)?;
        Ok(Served::passthrough(response, HTML))
    }

    /// `GET /simple/<package>/`: rewritten package index
    ///
    /// On success the package's resolver row is replaced. Error pages from
    /// the origin are passed through and leave the resolver untouched.
    pub fn package_index(&self, package: &str) -> MirrorResult<Served> {
        validate_component(package)?;

        let url = format!("{}/{}/", self.index_url, package);
        let page_url = Url::parse(&url).map_err(|e| MirrorError::origin(&url, e))?;
        let response = self.origin.fetch(&url)?;

        if !response.is_success() {
            warn!(
                "Origin answered {} for index of {}",
                response.status, package
            );
            return Ok(Served::passthrough(response, HTML));
        }

        let html = String::from_utf8_lossy(&response.body);
        let rewritten = rewrite_index(package, &page_url, &html);
        info!(
            "Rendered index for {} ({} resolver entries)",
            package,
            rewritten.links.len()
        );
        self.resolver.replace(package, rewritten.links);

        Ok(Served {
            status: response.status,
            content_type: response.content_type.unwrap_or_else(|| HTML.to_string()),
            body: rewritten.body.into_bytes(),
        })
    }

    /// `GET /simple/<package>/<filename>`: artifact bytes
    ///
    /// Filenames ending in `.metadata` are answered by [`Mirror::metadata`].
    pub fn artifact(&self, package: &str, filename: &str) -> MirrorResult<Served> {
        if let Some(artifact) = strip_metadata_suffix(filename) {
            return self.metadata(package, artifact);
        }

        let path = self.artifact_path(package, filename)?;
        let body = fs::read(&path)
            .map_err(|e| MirrorError::io(format!("reading {}", path.display()), e))?;
        info!("Serving {} ({} bytes)", path.display(), body.len());

        Ok(Served::ok(OCTET_STREAM, body))
    }

    /// Local file to serve for an artifact, downloading and patching first
    /// when needed
    pub fn artifact_path(&self, package: &str, filename: &str) -> MirrorResult<PathBuf> {
        validate_component(package)?;
        validate_component(filename)?;

        let handle = self.locks.handle(package, filename);
        let _guard = handle.lock();

        let transform = self.rules.should_transform(package, filename);
        if transform {
            if let Some(path) = self.modified.get(package, filename)? {
                debug!("Serving already patched {}", path.display());
                return Ok(path);
            }
        }

        let cached = self.ensure_cached(package, filename)?;
        if !transform {
            return Ok(cached);
        }

        self.ensure_patched(package, filename, &cached)
    }

    /// `GET /simple/<package>/<filename>.metadata`: proxied sidecar
    ///
    /// `filename` is the artifact name without the `.metadata` suffix.
    pub fn metadata(&self, package: &str, filename: &str) -> MirrorResult<Served> {
        let key = format!("{}{}", filename, METADATA_SUFFIX);
        let miss = || MirrorError::MetadataMiss {
            package: package.to_string(),
            filename: key.clone(),
        };

        let url = self.resolver.resolve(package, &key).ok_or_else(miss)?;
        let response = self.origin.fetch(&url)?;

        if response.status == 404 {
            warn!("Metadata not found at {}", url);
            return Err(miss());
        }

        Ok(Served::passthrough(response, PLAIN))
    }

    fn ensure_cached(&self, package: &str, filename: &str) -> MirrorResult<PathBuf> {
        if let Some(path) = self.raw.get(package, filename)? {
            debug!("Cache hit for {}/{}", package, filename);
            return Ok(path);
        }

        let url = self
            .resolver
            .resolve(package, filename)
            .ok_or_else(|| MirrorError::ResolverMiss {
                package: package.to_string(),
                filename: filename.to_string(),
            })?;

        info!("Downloading {} into cache", url);
        let path = self.raw.write_with(package, filename, |file| {
            self.origin.download(&url, file).map(|_| ())
        })?;

        self.audit.log(
            "artifact.cached",
            &json!({
                "package": package,
                "filename": filename,
                "url": url,
                "sha256": digest(&path),
            }),
        );

        Ok(path)
    }

    fn ensure_patched(
        &self,
        package: &str,
        filename: &str,
        cached: &Path,
    ) -> MirrorResult<PathBuf> {
        if self.modified.has_unmodified_marker(package, filename)? {
            debug!("{}/{} previously needed no patching", package, filename);
            return Ok(cached.to_path_buf());
        }

        let outcome = patch_wheel(
            cached,
            package,
            filename,
            &self.modified,
            &self.scratch_root,
        )?;
        match outcome {
            PatchOutcome::Patched { path, files } => {
                self.audit.log(
                    "artifact.transformed",
                    &json!({
                        "package": package,
                        "filename": filename,
                        "files": files,
                        "original_sha256": digest(cached),
                        "patched_sha256": digest(&path),
                    }),
                );
                Ok(path)
            }
            PatchOutcome::Unchanged => {
                info!(
                    "Nothing to patch in {}/{}, serving original",
                    package, filename
                );
                self.modified.mark_unmodified(package, filename)?;
                self.audit.log(
                    "artifact.unmodified",
                    &json!({
                        "package": package,
                        "filename": filename,
                        "sha256": digest(cached),
                    }),
                );
                Ok(cached.to_path_buf())
            }
        }
    }
}

fn digest(path: &Path) -> Option<String> {
    sha256_file(path)
        .map_err(|e| warn!("Could not hash {}: {}", path.display(), e))
        .ok()
}
