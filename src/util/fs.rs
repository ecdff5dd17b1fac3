//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{glob, Pattern};

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Regular files under `base` matching `pattern`, sorted.
pub fn glob_files(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    // `base` is a literal path and may contain glob metacharacters
    let base = Pattern::escape(&base.to_string_lossy());
    let full = format!("{}/{}", base.trim_end_matches('/'), pattern);

    let mut files = Vec::new();
    for entry in glob(&full).with_context(|| format!("invalid glob pattern: {}", pattern))? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("skipping unreadable path: {}", e),
        }
    }
    files.sort();
    Ok(files)
}

/// Copy the files under `src` matching `pattern` into `dst`, keeping their
/// paths relative to `src`. Returns the copied destination paths.
pub fn copy_matching(pattern: &str, src: &Path, dst: &Path) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();

    for file in glob_files(src, pattern)? {
        let relative = pathdiff::diff_paths(&file, src).unwrap_or_else(|| file.clone());
        let target = dst.join(relative);
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(&file, &target).with_context(|| {
            format!("failed to copy {} to {}", file.display(), target.display())
        })?;
        copied.push(target);
    }

    Ok(copied)
}
