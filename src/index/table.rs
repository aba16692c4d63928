//! Per-package routing from local filenames to origin URLs
//!
//! Rows are built privately while an index page is rewritten and then
//! swapped in with a single insert. A lookup racing a re-render sees either
//! the previous row or the new one, never a half-built row.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::filename::METADATA_SUFFIX;

/// Filename → origin URL links discovered on one package's index page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageLinks {
    links: BTreeMap<String, String>,
}

impl PackageLinks {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artifact together with its synthesized metadata sidecar
    pub fn record_artifact(&mut self, filename: &str, url: &Url) {
        let mut metadata = url.clone();
        metadata.set_path(&format!("{}{}", url.path(), METADATA_SUFFIX));

        self.links.insert(filename.to_string(), url.to_string());
        self.links.insert(
            format!("{}{}", filename, METADATA_SUFFIX),
            metadata.to_string(),
        );
    }

    /// Record a link that already points at a metadata sidecar
    pub fn record_metadata(&mut self, filename: &str, url: &Url) {
        self.links.insert(filename.to_string(), url.to_string());
    }

    /// Look up the origin URL for a local filename
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.links.get(filename).map(String::as_str)
    }

    /// Local filenames in this row, sorted
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Process-wide resolver table shared by all request handlers
#[derive(Debug, Default)]
pub struct ResolverTable {
    rows: DashMap<String, Arc<PackageLinks>>,
}

impl ResolverTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a package's row wholesale
    pub fn replace(&self, package: &str, links: PackageLinks) {
        debug!(
            "Resolver row for {} now has {} entries",
            package,
            links.len()
        );
        self.rows.insert(package.to_string(), Arc::new(links));
    }

    /// Resolve a local filename to its origin URL
    pub fn resolve(&self, package: &str, filename: &str) -> Option<String> {
        let row = self.row(package)?;
        row.get(filename).map(str::to_string)
    }

    /// Snapshot of a package's current row
    pub fn row(&self, package: &str) -> Option<Arc<PackageLinks>> {
        self.rows.get(package).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of packages rendered so far
    pub fn package_count(&self) -> usize {
        self.rows.len()
    }
}
