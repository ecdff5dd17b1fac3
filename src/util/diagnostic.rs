//! User-facing diagnostic messages.
//!
//! A diagnostic names what failed, the facts that led there, and what to try
//! next.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

/// Common suggestion messages.
pub mod suggestions {
    /// A version without source metadata was requested.
    pub const UNSUPPORTED_VERSION: &str =
        "Pass one of the listed versions with `--version`, or add it to the source data";

    /// An option name is not declared by the recipe.
    pub const UNKNOWN_OPTION: &str = "Run `quay inspect` to list the declared options";

    /// A requirement could not be found under the dependency root.
    pub const MISSING_DEPENDENCY: &str =
        "Build the dependency first, or point `--deps-root` at a directory that contains it";

    /// Fetching the source failed.
    pub const FETCH_FAILED: &str =
        "Check your network connection, or set `net.offline = false` in .quay/config.toml";

    /// A patch did not apply.
    pub const PATCH_FAILED: &str =
        "Check that the patch was generated against the selected source version";

    /// A rewrite target is gone.
    pub const REWRITE_TARGET_MISSING: &str =
        "The upstream build description changed; update the recipe's rewrite rules";

    /// The build tool failed.
    pub const BUILD_FAILED: &str = "Run `quay create --verbose` for the full tool output";
}

/// An error report with optional location, tool output, and hints.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    /// Tool output or other detail, printed indented under the message
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for a terminal, with ANSI styling when `color` is set.
    pub fn format(&self, color: bool) -> String {
        let paint = |code: &str, text: &str| {
            if color {
                format!("\x1b[{}m{}\x1b[0m", code, text)
            } else {
                text.to_string()
            }
        };

        let mut out = format!("{}: {}\n", paint("1;31", "error"), self.message);

        if let Some(path) = &self.location {
            let _ = writeln!(out, "  --> {}", path.display());
        }
        for line in self.context.iter().flat_map(|ctx| ctx.lines()) {
            let _ = writeln!(out, "  | {}", line);
        }

        if !self.suggestions.is_empty() {
            let _ = writeln!(out, "\n{}: consider:", paint("1;32", "help"));
            for (n, suggestion) in self.suggestions.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", n + 1, suggestion);
            }
        }

        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
