//! Source archive retrieval.

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;
use url::Url;

use crate::sources::metadata::SourceDescriptor;
use crate::util::hash::sha256_bytes;

/// Retrieves a source archive and extracts it.
pub trait Fetcher {
    /// Fetch `source`, verify its checksum, and extract it into `dest` with
    /// the top-level `strip_prefix` directory removed.
    fn fetch(&self, source: &SourceDescriptor, strip_prefix: &str, dest: &Path) -> Result<()>;
}

/// Fetches gzip-compressed tarballs over HTTP(S) or from `file://` URLs.
#[derive(Debug, Clone, Default)]
pub struct TarballFetcher {
    offline: bool,
}

impl TarballFetcher {
    pub fn new() -> Self {
        TarballFetcher::default()
    }

    /// Refuse network access. `file://` URLs still work.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    fn download(&self, url: &Url) -> Result<Vec<u8>> {
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| anyhow::anyhow!("invalid file URL: {}", url))?;
            return std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()));
        }

        if self.offline {
            bail!("network access is disabled (offline mode)");
        }

        tracing::info!("Fetching tarball from {}", url);

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("quay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;

        let response = client
            .get(url.clone())
            .send()
            .with_context(|| format!("failed to download tarball from {}", url))?;

        if !response.status().is_success() {
            bail!(
                "failed to download tarball from {}: HTTP {}",
                url,
                response.status()
            );
        }

        let bytes = response
            .bytes()
            .context("failed to read tarball response body")?;
        Ok(bytes.to_vec())
    }
}

impl Fetcher for TarballFetcher {
    fn fetch(&self, source: &SourceDescriptor, strip_prefix: &str, dest: &Path) -> Result<()> {
        let url = Url::parse(&source.url)
            .with_context(|| format!("invalid source URL: {}", source.url))?;

        let data = self.download(&url)?;

        let actual = sha256_bytes(&data);
        if !actual.eq_ignore_ascii_case(&source.sha256) {
            bail!(
                "tarball hash mismatch for {}:\n  expected: {}\n  actual:   {}",
                source.url,
                source.sha256,
                actual
            );
        }
        tracing::debug!("Tarball hash verified: {}", &actual[..16]);

        extract_tarball(&data, dest, Some(strip_prefix))
            .with_context(|| format!("failed to extract tarball from {}", source.url))?;

        tracing::info!("Extracted {} to {}", source.url, dest.display());
        Ok(())
    }
}

/// Map an archive entry to its destination path, or `None` to skip it.
fn entry_destination(entry_path: &Path, dest: &Path, strip_prefix: Option<&str>) -> Result<Option<PathBuf>> {
    let normalized = entry_path.to_string_lossy().replace('\\', "/");
    let relative = match strip_prefix.map(|p| p.trim_end_matches('/')) {
        Some(prefix) if normalized.trim_end_matches('/') == prefix => return Ok(None),
        Some(prefix) => match normalized.strip_prefix(&format!("{}/", prefix)) {
            Some(rest) => rest.to_string(),
            // Archives sometimes carry metadata entries next to the prefix
            None => {
                tracing::debug!("skipping entry outside `{}`: {}", prefix, normalized);
                return Ok(None);
            }
        },
        None => normalized,
    };

    if relative.is_empty() {
        return Ok(None);
    }

    let relative = PathBuf::from(relative);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        bail!(
            "tarball entry escapes destination directory: {}",
            entry_path.display()
        );
    }

    Ok(Some(dest.join(relative)))
}

/// Reject a symlink whose target leaves the extracted tree. `link` is the
/// link's own path relative to the destination directory.
fn check_symlink_target(link: &Path, target: &Path) -> Result<()> {
    // Directories between the destination root and the link
    let mut depth = link.components().count().saturating_sub(1);
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => depth -= 1,
            _ => bail!(
                "tarball symlink escapes destination directory: {} -> {}",
                link.display(),
                target.display()
            ),
        }
    }
    Ok(())
}

/// Extract a gzip-compressed tarball into `dest`.
pub fn extract_tarball(data: &[u8], dest: &Path, strip_prefix: Option<&str>) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    for entry in archive.entries().context("failed to read tarball entries")? {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry.path().context("failed to get entry path")?.into_owned();

        let Some(output_path) = entry_destination(&entry_path, dest, strip_prefix)? else {
            continue;
        };

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&output_path).with_context(|| {
                    format!("failed to create directory: {}", output_path.display())
                })?;
            }
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                entry.unpack(&output_path).with_context(|| {
                    format!("failed to extract file: {}", output_path.display())
                })?;
            }
            tar::EntryType::Link => {
                // Hard link targets are archive paths, mapped like any entry
                let target = entry
                    .link_name()
                    .context("failed to read hard link target")?
                    .map(|target| entry_destination(&target, dest, strip_prefix))
                    .transpose()?
                    .flatten();
                let Some(target) = target else {
                    bail!(
                        "tarball hard link points outside the archive: {}",
                        entry_path.display()
                    );
                };
                std::fs::hard_link(&target, &output_path).with_context(|| {
                    format!("failed to create hard link: {}", output_path.display())
                })?;
            }
            tar::EntryType::Symlink => {
                let Some(target) = entry
                    .link_name()
                    .context("failed to read symlink target")?
                    .map(|target| target.into_owned())
                else {
                    continue;
                };
                let link = output_path.strip_prefix(dest).unwrap_or(&output_path);
                check_symlink_target(link, &target)?;

                #[cfg(unix)]
                std::os::unix::fs::symlink(&target, &output_path).with_context(|| {
                    format!("failed to create symlink: {}", output_path.display())
                })?;
                #[cfg(not(unix))]
                tracing::debug!("Skipping symlink: {}", entry_path.display());
            }
            _ => {
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path.display()
                );
            }
        }
    }

    Ok(())
}
