//! Typed text edits against files of the staged source tree.
//!
//! Every edit must match at least once. An edit that matches nothing means
//! the upstream build description changed shape, and building anyway would
//! quietly bring back the behavior the edit exists to remove.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Replacement text of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    Literal(String),
    /// The library variable the dependency resolver generates for a package.
    LibsVariable(String),
}

/// Replace every occurrence of `find`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub find: String,
    pub replace: Replacement,
}

impl TextEdit {
    pub fn replace(find: impl Into<String>, with: impl Into<String>) -> Self {
        TextEdit {
            find: find.into(),
            replace: Replacement::Literal(with.into()),
        }
    }

    pub fn remove(find: impl Into<String>) -> Self {
        TextEdit::replace(find, "")
    }

    pub fn to_libs_variable(find: impl Into<String>, package: impl Into<String>) -> Self {
        TextEdit {
            find: find.into(),
            replace: Replacement::LibsVariable(package.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("`{pattern}` not found in {}", file.display())]
    TargetMissing { file: PathBuf, pattern: String },

    #[error("failed to rewrite {}: {source}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Replace every occurrence of `find` in `content`, returning the new text and
/// the number of replacements.
pub fn replace_all(content: &str, find: &str, with: &str) -> (String, usize) {
    let count = content.matches(find).count();
    if count == 0 {
        return (content.to_string(), 0);
    }
    (content.replace(find, with), count)
}

/// Rewrite a file in place. Fails without touching the file when `find` does
/// not occur in it.
pub fn rewrite_file(file: &Path, find: &str, with: &str) -> Result<usize, RewriteError> {
    let content = fs::read_to_string(file).map_err(|source| RewriteError::Io {
        file: file.to_path_buf(),
        source,
    })?;

    let (rewritten, count) = replace_all(&content, find, with);
    if count == 0 {
        return Err(RewriteError::TargetMissing {
            file: file.to_path_buf(),
            pattern: find.to_string(),
        });
    }

    fs::write(file, rewritten).map_err(|source| RewriteError::Io {
        file: file.to_path_buf(),
        source,
    })?;

    Ok(count)
}
