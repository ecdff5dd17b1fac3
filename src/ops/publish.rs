//! Package output: license publication, link metadata, and the final rename.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::definitions::Definitions;
use crate::builder::util::collect_libs;
use crate::core::option::OptionSet;
use crate::core::requirement::Requirement;
use crate::core::rules::SystemLibRule;
use crate::core::settings::Settings;
use crate::ops::errors::{render, RecipeError};
use crate::resolver::ResolvedConfig;
use crate::util::fs::{copy_matching, remove_dir_all_if_exists};

/// Name of the manifest written into every package.
pub const PACKAGE_INFO_FILE: &str = "quayinfo.json";

/// A published package and what consumers need to link against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOutput {
    pub name: String,
    pub version: String,
    pub package_dir: PathBuf,
    pub options: OptionSet,
    pub settings: Settings,
    pub requires: Vec<Requirement>,
    /// Libraries produced by the build, by link name
    pub libs: Vec<String>,
    /// Extra libraries consumers must link from the system
    pub system_libs: Vec<String>,
    pub definitions: Definitions,
}

impl PackageOutput {
    pub fn package_id(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// All link libraries in link order: own libraries, then system ones.
    pub fn link_libs(&self) -> Vec<String> {
        self.libs
            .iter()
            .chain(self.system_libs.iter())
            .cloned()
            .collect()
    }
}

/// System libraries whose conditions hold, in declaration order.
pub fn system_libs(rules: &[SystemLibRule], config: &ResolvedConfig) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| rule.when.holds(config))
        .map(|rule| rule.name.clone())
        .collect()
}

/// Copy the license files matching `pattern` from the source tree into
/// `<staging>/licenses`.
pub fn copy_license(pattern: &str, source_dir: &Path, staging: &Path) -> Result<Vec<PathBuf>, RecipeError> {
    let copied = copy_matching(pattern, source_dir, &staging.join("licenses")).map_err(|e| {
        RecipeError::Io {
            context: format!("failed to copy license files from {}", source_dir.display()),
            source: std::io::Error::other(render(&e)),
        }
    })?;

    if copied.is_empty() {
        return Err(RecipeError::LicenseNotFound {
            pattern: pattern.to_string(),
            dir: source_dir.to_path_buf(),
        });
    }

    Ok(copied)
}

/// Library link names found under `<staging>/lib`.
pub fn scan_libs(staging: &Path) -> Result<Vec<String>, RecipeError> {
    collect_libs(&staging.join("lib")).map_err(|e| RecipeError::Publish {
        diagnostic: render(&e),
    })
}

/// Write the manifest into the staging directory and move it to
/// `package_dir`. An existing package is replaced.
pub fn publish(output: &PackageOutput, staging: &Path) -> Result<(), RecipeError> {
    let manifest = serde_json::to_string_pretty(output)
        .map_err(|e| RecipeError::Publish { diagnostic: e.to_string() })?;
    std::fs::write(staging.join(PACKAGE_INFO_FILE), manifest)
        .map_err(|e| RecipeError::io(format!("failed to write {}", PACKAGE_INFO_FILE), e))?;

    swap_into_place(staging, &output.package_dir)?;

    tracing::info!("Published {} to {}", output.package_id(), output.package_dir.display());
    Ok(())
}

/// Rename `staging` to `package_dir`. A previous package is moved aside
/// first and only deleted once the new one is in place; if the rename
/// fails it is moved back.
fn swap_into_place(staging: &Path, package_dir: &Path) -> Result<(), RecipeError> {
    let failed = |e: anyhow::Error| RecipeError::Publish { diagnostic: render(&e) };
    let previous = package_dir.with_file_name("package.previous");

    remove_dir_all_if_exists(&previous).map_err(failed)?;
    let had_previous = package_dir.exists();
    if had_previous {
        std::fs::rename(package_dir, &previous).map_err(|e| {
            RecipeError::io(format!("failed to move aside {}", package_dir.display()), e)
        })?;
    }

    if let Err(e) = std::fs::rename(staging, package_dir) {
        if had_previous {
            if let Err(restore) = std::fs::rename(&previous, package_dir) {
                tracing::warn!(
                    "could not restore {} from {}: {}",
                    package_dir.display(),
                    previous.display(),
                    restore
                );
            }
        }
        return Err(RecipeError::io(
            format!(
                "failed to move {} to {}",
                staging.display(),
                package_dir.display()
            ),
            e,
        ));
    }

    if had_previous {
        if let Err(e) = remove_dir_all_if_exists(&previous) {
            tracing::warn!("failed to remove previous package: {:#}", e);
        }
    }
    Ok(())
}
