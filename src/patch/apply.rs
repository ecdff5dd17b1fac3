//! Patch application.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::util::process::{failure_detail, find_executable, ProcessBuilder};

/// Applies a unified diff to a staged source tree.
pub trait PatchTool {
    /// Apply `patch_file` inside `source_root`. When `base_path` is given the
    /// paths in the patch are relative to that subdirectory.
    fn apply(&self, patch_file: &Path, source_root: &Path, base_path: Option<&str>) -> Result<()>;
}

/// Applies patches with `git apply`.
///
/// The patch is checked with `git apply --check` first so that a patch that
/// cannot apply leaves the tree untouched.
#[derive(Debug, Clone)]
pub struct GitApply {
    git: Option<PathBuf>,
}

impl GitApply {
    /// Locate `git` on the PATH. A missing git only becomes an error once a
    /// patch has to be applied.
    pub fn new() -> Self {
        GitApply {
            git: find_executable("git"),
        }
    }

    fn git(&self) -> Result<&Path> {
        match &self.git {
            Some(git) => Ok(git),
            None => bail!(
                "git not found\n\
                 \n\
                 git is required to apply source patches.\n\
                 Install git and ensure it's in your PATH."
            ),
        }
    }

    fn command(git: &Path, source_root: &Path, base_path: Option<&str>) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(git).cwd(source_root);
        // Keep git from resolving paths against an enclosing repository
        if let Some(parent) = source_root.parent() {
            cmd = cmd.env("GIT_CEILING_DIRECTORIES", parent);
        }
        cmd = cmd.arg("apply").arg("--whitespace=nowarn");
        if let Some(base) = base_path {
            cmd = cmd.arg(format!("--directory={}", base));
        }
        cmd
    }
}

impl Default for GitApply {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchTool for GitApply {
    fn apply(&self, patch_file: &Path, source_root: &Path, base_path: Option<&str>) -> Result<()> {
        let git = self.git()?;
        tracing::info!("Applying patch: {}", patch_file.display());

        let check = Self::command(git, source_root, base_path)
            .arg("--check")
            .arg(patch_file)
            .exec()?;
        if !check.status.success() {
            bail!(
                "patch '{}' will not apply cleanly:\n{}",
                patch_file.display(),
                failure_detail(&check)
            );
        }

        let cmd = Self::command(git, source_root, base_path).arg(patch_file);
        tracing::debug!("running `{}`", cmd.display_command());
        let apply = cmd.exec()?;
        if !apply.status.success() {
            bail!(
                "failed to apply patch '{}':\n{}",
                patch_file.display(),
                failure_detail(&apply)
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_uses_base_path_as_directory() {
        let git = Path::new("git");
        let cmd = GitApply::command(git, Path::new("/work/src"), Some("lib"));
        assert_eq!(
            cmd.display_command(),
            "git apply --whitespace=nowarn --directory=lib"
        );

        let cmd = GitApply::command(git, Path::new("/work/src"), None);
        assert_eq!(cmd.display_command(), "git apply --whitespace=nowarn");
    }

    #[test]
    fn test_missing_git_fails_on_apply() {
        let tool = GitApply { git: None };
        let err = tool
            .apply(Path::new("a.patch"), Path::new("/work/src"), None)
            .unwrap_err();
        assert!(err.to_string().contains("git not found"));
    }

    const ZIP_CLOSE: &str = "int zip_close(void) {\n    mask = umask(022);\n    return 0;\n}\n";

    const PATCH: &str = "\
--- a/zip_close.c
+++ b/zip_close.c
@@ -1,4 +1,4 @@
 int zip_close(void) {
-    mask = umask(022);
+    mask = umask(S_IWGRP | S_IWOTH);
     return 0;
 }
";

    /// A staged tree with `lib/zip_close.c`, or `None` when git is missing.
    fn staged() -> Option<(tempfile::TempDir, PathBuf, GitApply)> {
        let git = which::which("git").ok()?;
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("source_subfolder");
        std::fs::create_dir_all(src.join("lib")).unwrap();
        std::fs::write(src.join("lib/zip_close.c"), ZIP_CLOSE).unwrap();
        Some((tmp, src, GitApply { git: Some(git) }))
    }

    #[test]
    fn test_git_apply_with_base_path() {
        let Some((tmp, src, tool)) = staged() else {
            return;
        };
        let patch = tmp.path().join("0001-zip-close-permissions.patch");
        std::fs::write(&patch, PATCH).unwrap();

        tool.apply(&patch, &src, Some("lib")).unwrap();

        let patched = std::fs::read_to_string(src.join("lib/zip_close.c")).unwrap();
        assert!(patched.contains("umask(S_IWGRP | S_IWOTH)"));
        assert!(!patched.contains("umask(022)"));
    }

    #[test]
    fn test_git_apply_rejects_stale_patch() {
        let Some((tmp, src, tool)) = staged() else {
            return;
        };
        let patch = tmp.path().join("stale.patch");
        std::fs::write(&patch, PATCH.replace("umask(022)", "umask(077)")).unwrap();

        let err = tool.apply(&patch, &src, Some("lib")).unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("will not apply cleanly"));
        assert!(message.contains("zip_close.c"));
        assert_eq!(
            std::fs::read_to_string(src.join("lib/zip_close.c")).unwrap(),
            ZIP_CLOSE
        );
    }
}
