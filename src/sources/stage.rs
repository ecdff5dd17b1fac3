//! Source staging.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::cmake::is_cmake_project;
use crate::sources::fetch::Fetcher;
use crate::sources::metadata::VersionEntry;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};

/// Default top-level directory of an upstream archive.
pub fn default_strip_prefix(name: &str, version: &str) -> String {
    format!("{}-{}", name, version)
}

/// Fetch the source of `entry` into `dest`.
///
/// The tree is extracted into a temporary sibling directory first and only
/// renamed into place once complete, so `dest` never holds a half-extracted
/// tree. An existing `dest` is replaced.
pub fn stage_source(
    fetcher: &dyn Fetcher,
    name: &str,
    entry: &VersionEntry<'_>,
    dest: &Path,
) -> Result<PathBuf> {
    let strip_prefix = entry
        .source
        .strip_prefix
        .clone()
        .unwrap_or_else(|| default_strip_prefix(name, entry.version));

    remove_dir_all_if_exists(dest)?;
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    // Removed on drop unless renamed into place
    let partial = tempfile::Builder::new()
        .prefix(".partial-")
        .tempdir_in(parent)
        .with_context(|| format!("failed to create staging directory in {}", parent.display()))?;

    tracing::info!("Staging {} {} into {}", name, entry.version, dest.display());
    fetcher.fetch(entry.source, &strip_prefix, partial.path())?;

    if !is_cmake_project(partial.path()) {
        bail!(
            "no CMakeLists.txt at the top of the {} {} source (strip_prefix `{}`)",
            name,
            entry.version,
            strip_prefix
        );
    }

    std::fs::rename(partial.path(), dest).with_context(|| {
        format!(
            "failed to move {} to {}",
            partial.path().display(),
            dest.display()
        )
    })?;

    Ok(dest.to_path_buf())
}
