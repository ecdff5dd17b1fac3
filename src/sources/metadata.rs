//! Version-keyed source metadata.
//!
//! A source data file maps each supported version to where its source comes
//! from and which patches apply to it:
//!
//! ```toml
//! [sources."1.5.2"]
//! url = "https://github.com/nih-at/libzip/releases/download/rel-1-5-2/libzip-1.5.2.tar.gz"
//! sha256 = "be694a4abb2ffe5ec02074146757c8b56084dbcebf329123c84b205417435e15"
//!
//! [[patches."1.5.2"]]
//! patch_file = "patches/0001-fix-install-paths.patch"
//! base_path = "lib"
//! ```
//!
//! Patch files are resolved relative to the directory of the data file. A
//! version with a source but no `patches` list has no patches.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::hash::is_sha256_hex;

/// Where to fetch the source of one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub url: String,

    /// SHA256 of the archive
    pub sha256: String,

    /// Top-level directory to strip from the archive. Defaults to
    /// `<name>-<version>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,
}

/// A patch applied to the staged source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchDescriptor {
    /// Path of the patch file, relative to the source data directory
    pub patch_file: String,

    /// SHA256 of the patch file bytes, verified before applying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    /// Directory inside the source tree the patch paths are relative to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

/// The metadata selected for the active version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionEntry<'a> {
    pub version: &'a str,
    pub source: &'a SourceDescriptor,
    pub patches: &'a [PatchDescriptor],
}

/// Version-keyed source and patch metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceData {
    #[serde(default)]
    pub sources: BTreeMap<String, SourceDescriptor>,

    #[serde(default)]
    pub patches: BTreeMap<String, Vec<PatchDescriptor>>,

    /// Directory patch files are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

impl SourceData {
    /// Load and validate a source data file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source data: {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        Self::parse(&content, base_dir)
            .with_context(|| format!("invalid source data: {}", path.display()))
    }

    /// Parse source data from TOML content.
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let mut data: SourceData = toml::from_str(content)?;
        data.base_dir = base_dir.to_path_buf();
        data.validate()?;
        Ok(data)
    }

    /// Validate URLs, hash formats, and that patches belong to a known version.
    pub fn validate(&self) -> Result<()> {
        for (version, source) in &self.sources {
            url::Url::parse(&source.url).with_context(|| {
                format!("invalid source URL '{}' for version {}", source.url, version)
            })?;

            if !is_sha256_hex(&source.sha256) {
                bail!(
                    "source sha256 for version {} must be a 64-character hex string, got '{}'",
                    version,
                    source.sha256
                );
            }
        }

        for (version, patches) in &self.patches {
            if !self.sources.contains_key(version) {
                bail!("patches listed for version {} which has no source", version);
            }

            for patch in patches {
                if let Some(sha256) = &patch.sha256 {
                    if !is_sha256_hex(sha256) {
                        bail!(
                            "patch sha256 must be a 64-character hex string for '{}', got '{}'",
                            patch.patch_file,
                            sha256
                        );
                    }
                }
                if Path::new(&patch.patch_file).is_absolute() {
                    bail!("patch path '{}' must be relative", patch.patch_file);
                }
            }
        }

        Ok(())
    }

    /// Look up the metadata for a version.
    pub fn entry(&self, version: &str) -> Option<VersionEntry<'_>> {
        let (version, source) = self.sources.get_key_value(version)?;
        let patches = self
            .patches
            .get(version)
            .map(Vec::as_slice)
            .unwrap_or_default();

        Some(VersionEntry {
            version,
            source,
            patches,
        })
    }

    /// All versions with a source, in sorted order.
    pub fn versions(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    /// Absolute path of a patch file.
    pub fn patch_path(&self, patch: &PatchDescriptor) -> PathBuf {
        self.base_dir.join(&patch.patch_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HASH: &str = "be694a4abb2ffe5ec02074146757c8b56084dbcebf329123c84b205417435e15";

    fn data_with_patch() -> String {
        format!(
            r#"
[sources."1.5.2"]
url = "https://example.com/libzip-1.5.2.tar.gz"
sha256 = "{HASH}"

[sources."1.6.0"]
url = "https://example.com/libzip-1.6.0.tar.gz"
sha256 = "{HASH}"
strip_prefix = "libzip"

[[patches."1.5.2"]]
patch_file = "patches/0001-a.patch"

[[patches."1.5.2"]]
patch_file = "patches/0002-b.patch"
base_path = "lib"
sha256 = "{HASH}"
"#
        )
    }

    #[test]
    fn test_entry_lookup() {
        let tmp = TempDir::new().unwrap();
        let data = SourceData::parse(&data_with_patch(), tmp.path()).unwrap();

        let entry = data.entry("1.5.2").unwrap();
        assert_eq!(entry.version, "1.5.2");
        assert_eq!(entry.patches.len(), 2);
        assert_eq!(entry.patches[0].patch_file, "patches/0001-a.patch");
        assert_eq!(entry.patches[1].base_path.as_deref(), Some("lib"));
        assert_eq!(
            data.patch_path(&entry.patches[0]),
            tmp.path().join("patches/0001-a.patch")
        );

        let entry = data.entry("1.6.0").unwrap();
        assert!(entry.patches.is_empty());
        assert_eq!(entry.source.strip_prefix.as_deref(), Some("libzip"));

        assert!(data.entry("0.11").is_none());
        assert_eq!(data.versions(), vec!["1.5.2", "1.6.0"]);
    }

    #[test]
    fn test_rejects_bad_hash() {
        let content = r#"
[sources."1.5.2"]
url = "https://example.com/libzip-1.5.2.tar.gz"
sha256 = "abc123"
"#;
        let err = SourceData::parse(content, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("64-character hex"));
    }

    #[test]
    fn test_rejects_patches_without_source() {
        let content = format!(
            r#"
[sources."1.5.2"]
url = "https://example.com/libzip-1.5.2.tar.gz"
sha256 = "{HASH}"

[[patches."1.7.0"]]
patch_file = "patches/x.patch"
"#
        );
        let err = SourceData::parse(&content, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("1.7.0"));
    }

    #[test]
    fn test_load_resolves_patches_next_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sourcedata.toml");
        std::fs::write(&path, data_with_patch()).unwrap();

        let data = SourceData::load(&path).unwrap();
        let entry = data.entry("1.5.2").unwrap();
        assert!(data.patch_path(&entry.patches[1]).starts_with(tmp.path()));
    }
}
