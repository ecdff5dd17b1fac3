//! Ordered source modification: patches first, then rewrites.

use std::path::Path;

use serde::Serialize;

use crate::core::rules::RewriteRule;
use crate::deps::DependencyResolver;
use crate::ops::errors::{render, RecipeError};
use crate::patch::apply::PatchTool;
use crate::patch::rewrite::{rewrite_file, Replacement};
use crate::resolver::ResolvedConfig;
use crate::sources::metadata::{SourceData, VersionEntry};
use crate::util::hash::sha256_file;

/// What the pipeline did to the staged tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// Patches applied, in order
    pub patches: Vec<String>,
    /// Rewrites applied, as `(file, search text, replacement count)`
    pub rewrites: Vec<(String, String, usize)>,
}

/// Apply the version's patches, then every rewrite whose condition holds.
///
/// Stops at the first failure. Nothing is rolled back, so a tree that went
/// through a failed run must be restaged before retrying.
pub fn run_pipeline(
    source_root: &Path,
    source_data: &SourceData,
    entry: &VersionEntry<'_>,
    rewrites: &[RewriteRule],
    config: &ResolvedConfig,
    patcher: &dyn PatchTool,
    resolver: &dyn DependencyResolver,
) -> Result<PipelineReport, RecipeError> {
    let mut report = PipelineReport::default();

    for patch in entry.patches {
        let patch_path = source_data.patch_path(patch);
        let failed = |diagnostic: String| RecipeError::PatchApplication {
            patch: patch.patch_file.clone(),
            diagnostic,
        };

        if !patch_path.is_file() {
            return Err(failed(format!(
                "patch file not found: {}",
                patch_path.display()
            )));
        }

        if let Some(expected) = &patch.sha256 {
            let actual = sha256_file(&patch_path).map_err(|e| failed(render(&e)))?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(failed(format!(
                    "checksum mismatch\n  expected: {}\n  actual:   {}",
                    expected, actual
                )));
            }
        }

        patcher
            .apply(&patch_path, source_root, patch.base_path.as_deref())
            .map_err(|e| failed(render(&e)))?;
        report.patches.push(patch.patch_file.clone());
    }

    for rule in rewrites.iter().filter(|rule| rule.when.holds(config)) {
        let file = source_root.join(&rule.file);
        let with = match &rule.edit.replace {
            Replacement::Literal(text) => text.clone(),
            Replacement::LibsVariable(package) => resolver.libs_variable(package),
        };

        let count = rewrite_file(&file, &rule.edit.find, &with)?;
        tracing::debug!(
            "rewrote {} occurrence(s) of `{}` in {}",
            count,
            rule.edit.find,
            rule.file.display()
        );
        report
            .rewrites
            .push((rule.file.display().to_string(), rule.edit.find.clone(), count));
    }

    Ok(report)
}
