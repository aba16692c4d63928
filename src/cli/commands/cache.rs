//! Cache command - inspect cached and patched artifacts

use crate::cache::{format_bytes, ArtifactStore, StoredArtifact};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::MirrorResult;
use console::style;
use serde::Serialize;
use std::collections::BTreeSet;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> MirrorResult<()> {
    match args.action {
        CacheAction::List { format } => list_artifacts(config, format),
    }
}

/// One row of `cache list`
#[derive(Debug, Serialize)]
struct CachedArtifact {
    package: String,
    filename: String,
    size: u64,
    patched: bool,
}

fn list_artifacts(config: &Config, format: OutputFormat) -> MirrorResult<()> {
    let raw = ArtifactStore::new(&config.storage.cache_dir);
    let modified = ArtifactStore::new(&config.storage.modified_dir);
    let artifacts = collect_artifacts(raw.entries()?, modified.entries()?);

    if artifacts.is_empty() && !matches!(format, OutputFormat::Json) {
        println!("No cached artifacts found.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(&artifacts),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&artifacts)?),
        OutputFormat::Plain => print_plain(&artifacts),
    }

    Ok(())
}

/// Join both stores, flagging raw entries that have a patched copy
fn collect_artifacts(
    raw: Vec<StoredArtifact>,
    modified: Vec<StoredArtifact>,
) -> Vec<CachedArtifact> {
    let patched: BTreeSet<(String, String)> = modified
        .into_iter()
        .map(|a| (a.package, a.filename))
        .collect();

    raw.into_iter()
        .map(|a| {
            let is_patched = patched.contains(&(a.package.clone(), a.filename.clone()));
            CachedArtifact {
                package: a.package,
                filename: a.filename,
                size: a.size,
                patched: is_patched,
            }
        })
        .collect()
}

fn print_table(artifacts: &[CachedArtifact]) {
    println!(
        "{:<24} {:<56} {:>10} {:<8}",
        "PACKAGE", "FILENAME", "SIZE", "PATCHED"
    );
    println!("{}", "-".repeat(100));

    for artifact in artifacts {
        let patched = if artifact.patched {
            style("yes").yellow().to_string()
        } else {
            style("no").dim().to_string()
        };

        println!(
            "{:<24} {:<56} {:>10} {:<8}",
            artifact.package,
            artifact.filename,
            format_bytes(artifact.size),
            patched
        );
    }

    let total: u64 = artifacts.iter().map(|a| a.size).sum();
    println!();
    println!(
        "Total: {} artifact(s), {}",
        artifacts.len(),
        format_bytes(total)
    );
}

fn print_plain(artifacts: &[CachedArtifact]) {
    for artifact in artifacts {
        println!("{}/{}", artifact.package, artifact.filename);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(package: &str, filename: &str, size: u64) -> StoredArtifact {
        StoredArtifact {
            package: package.to_string(),
            filename: filename.to_string(),
            size,
        }
    }

    #[test]
    fn flags_patched_artifacts() {
        let raw = vec![
            stored("demo", "demo-1.0-py3-none-any.whl", 100),
            stored("demo", "demo-1.0.tar.gz", 50),
        ];
        let modified = vec![stored("demo", "demo-1.0-py3-none-any.whl", 120)];

        let rows = collect_artifacts(raw, modified);

        assert_eq!(rows.len(), 2);
        assert!(rows[0].patched);
        assert_eq!(rows[0].size, 100);
        assert!(!rows[1].patched);
    }

    #[test]
    fn modified_only_entries_are_not_listed() {
        let rows = collect_artifacts(vec![], vec![stored("demo", "x.whl", 1)]);
        assert!(rows.is_empty());
    }
}
