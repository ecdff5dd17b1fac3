//! Shared utilities for the builder module.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

/// File names a linker accepts as libraries: a stem, optional version
/// components on either side of the extension, and a library extension.
const LIBRARY_FILE: &str = r"^(?P<stem>[^.]+)(?:\.\d+)*\.(?P<ext>a|so|dylib|lib)(?:\.\d+)*$";

fn library_regex() -> Result<Regex> {
    Regex::new(LIBRARY_FILE).context("invalid library file pattern")
}

/// Extract the link name from a library file name.
///
/// - Strips the `lib` prefix for Unix archives: `libzip.a` → `zip`
/// - Strips version components: `libzip.so.5.0` → `zip`, `libzip.5.dylib` → `zip`
/// - Keeps Windows import library names as-is: `zip.lib` → `zip`
///
/// Returns `None` for files that are not libraries.
pub fn lib_name_from_file(re: &Regex, file_name: &str) -> Option<String> {
    let caps = re.captures(file_name)?;
    let stem = caps.name("stem")?.as_str();

    let name = if caps.name("ext")?.as_str() == "lib" {
        stem
    } else {
        stem.strip_prefix("lib").filter(|s| !s.is_empty()).unwrap_or(stem)
    };

    Some(name.to_string())
}

/// Find every library file under `dir`, sorted by path.
pub fn find_library_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let re = library_regex()?;
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if re.is_match(&name) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Collect the link names of every library under `dir`, sorted and without
/// duplicates (a shared library and its versioned symlinks share one name).
pub fn collect_libs(dir: &Path) -> Result<Vec<String>> {
    let re = library_regex()?;
    let names: BTreeSet<String> = find_library_files(dir)?
        .iter()
        .filter_map(|path| path.file_name())
        .filter_map(|name| lib_name_from_file(&re, &name.to_string_lossy()))
        .collect();

    Ok(names.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn name(file: &str) -> Option<String> {
        lib_name_from_file(&library_regex().unwrap(), file)
    }

    #[test]
    fn test_lib_name_unix_static() {
        assert_eq!(name("libz.a"), Some("z".to_string()));
        assert_eq!(name("libzip.a"), Some("zip".to_string()));
    }

    #[test]
    fn test_lib_name_unix_shared() {
        assert_eq!(name("libzip.so"), Some("zip".to_string()));
        assert_eq!(name("libzip.so.5"), Some("zip".to_string()));
        assert_eq!(name("libzip.so.5.0.0"), Some("zip".to_string()));
        assert_eq!(name("libzip.5.dylib"), Some("zip".to_string()));
    }

    #[test]
    fn test_lib_name_windows() {
        assert_eq!(name("zip.lib"), Some("zip".to_string()));
        assert_eq!(name("libcrypto.lib"), Some("libcrypto".to_string()));
    }

    #[test]
    fn test_non_libraries_are_ignored() {
        assert_eq!(name("zip.h"), None);
        assert_eq!(name("libzip.pc"), None);
        assert_eq!(name("zip.dll"), None);
    }

    #[test]
    fn test_collect_libs() {
        let tmp = TempDir::new().unwrap();
        let lib = tmp.path().join("lib");
        std::fs::create_dir_all(lib.join("pkgconfig")).unwrap();
        for file in ["libzip.so", "libzip.so.5", "libzip.so.5.0", "libbz2.a"] {
            std::fs::write(lib.join(file), b"").unwrap();
        }
        std::fs::write(lib.join("pkgconfig/libzip.pc"), b"").unwrap();

        assert_eq!(collect_libs(&lib).unwrap(), vec!["bz2", "zip"]);
        assert_eq!(find_library_files(&lib).unwrap().len(), 4);
    }

    #[test]
    fn test_collect_libs_missing_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(collect_libs(&tmp.path().join("lib")).unwrap().is_empty());
    }
}
