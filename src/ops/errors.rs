//! Lifecycle error types and diagnostics.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::option::OptionError;
use crate::patch::rewrite::RewriteError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// The phase a lifecycle failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Configure,
    Requirements,
    Source,
    Patch,
    Build,
    Package,
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::Requirements => "requirements",
            Stage::Source => "source",
            Stage::Patch => "patch",
            Stage::Build => "build",
            Stage::Package => "package",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a recipe invocation can fail.
///
/// Variants wrapping a collaborator failure carry its diagnostic text
/// verbatim.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum RecipeError {
    #[error("version `{version}` has no source metadata")]
    #[diagnostic(
        code(quay::configure::unsupported_version),
        help("Pass a version listed in the source data")
    )]
    UnsupportedVersion {
        version: String,
        available: Vec<String>,
    },

    #[error(transparent)]
    #[diagnostic(code(quay::configure::option))]
    InvalidOption(#[from] OptionError),

    #[error("could not resolve requirement `{requirement}`")]
    #[diagnostic(code(quay::requirements::resolve))]
    DependencyResolution {
        requirement: String,
        diagnostic: String,
    },

    #[error("failed to fetch {url}")]
    #[diagnostic(code(quay::source::fetch))]
    Fetch { url: String, diagnostic: String },

    #[error("failed to apply patch `{patch}`")]
    #[diagnostic(code(quay::patch::apply))]
    PatchApplication { patch: String, diagnostic: String },

    #[error("rewrite target `{pattern}` not found in {}", file.display())]
    #[diagnostic(
        code(quay::patch::rewrite_target_missing),
        help("The upstream build description changed; update the rewrite rules")
    )]
    RewriteTargetMissing { file: PathBuf, pattern: String },

    #[error("build failed")]
    #[diagnostic(code(quay::build::failed))]
    Build { diagnostic: String },

    #[error("install failed")]
    #[diagnostic(code(quay::package::install))]
    Install { diagnostic: String },

    #[error("no license file matching `{pattern}` in {}", dir.display())]
    #[diagnostic(code(quay::package::license_not_found))]
    LicenseNotFound { pattern: String, dir: PathBuf },

    #[error("build configuration changed between build and package")]
    #[diagnostic(code(quay::package::configuration_drift))]
    ConfigurationDrift { first: String, second: String },

    #[error("{context}")]
    #[diagnostic(code(quay::io))]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to publish package")]
    #[diagnostic(code(quay::publish::failed))]
    Publish { diagnostic: String },
}

impl RecipeError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        RecipeError::Io {
            context: context.into(),
            source,
        }
    }

    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RecipeError::UnsupportedVersion { version, available } => {
                let mut diag =
                    Diagnostic::error(format!("version `{}` has no source metadata", version));
                if !available.is_empty() {
                    diag = diag.with_context(format!(
                        "available versions: {}",
                        available.join(", ")
                    ));
                }
                diag.with_suggestion(suggestions::UNSUPPORTED_VERSION)
            }

            RecipeError::InvalidOption(err) => {
                let diag = Diagnostic::error(err.to_string());
                match err {
                    OptionError::Unknown(_) => diag.with_suggestion(suggestions::UNKNOWN_OPTION),
                    _ => diag,
                }
            }

            RecipeError::DependencyResolution {
                requirement,
                diagnostic,
            } => Diagnostic::error(format!("could not resolve requirement `{}`", requirement))
                .with_context(diagnostic.clone())
                .with_suggestion(suggestions::MISSING_DEPENDENCY),

            RecipeError::Fetch { url, diagnostic } => {
                Diagnostic::error(format!("failed to fetch {}", url))
                    .with_context(diagnostic.clone())
                    .with_suggestion(suggestions::FETCH_FAILED)
            }

            RecipeError::PatchApplication { patch, diagnostic } => {
                Diagnostic::error(format!("failed to apply patch `{}`", patch))
                    .with_context(diagnostic.clone())
                    .with_suggestion(suggestions::PATCH_FAILED)
            }

            RecipeError::RewriteTargetMissing { file, pattern } => {
                Diagnostic::error(format!("rewrite target `{}` not found", pattern))
                    .with_location(file)
                    .with_suggestion(suggestions::REWRITE_TARGET_MISSING)
            }

            RecipeError::Build { diagnostic } | RecipeError::Install { diagnostic } => {
                Diagnostic::error(self.to_string())
                    .with_context(diagnostic.clone())
                    .with_suggestion(suggestions::BUILD_FAILED)
            }

            RecipeError::LicenseNotFound { pattern, dir } => {
                Diagnostic::error(format!("no license file matching `{}`", pattern))
                    .with_location(dir)
            }

            RecipeError::ConfigurationDrift { first, second } => Diagnostic::error(self.to_string())
                .with_context(format!("at build:   {}", first))
                .with_context(format!("at package: {}", second)),

            RecipeError::Io { context, source } => {
                Diagnostic::error(context.clone()).with_context(source.to_string())
            }

            RecipeError::Publish { diagnostic } => {
                Diagnostic::error(self.to_string()).with_context(diagnostic.clone())
            }
        }
    }
}

impl From<RewriteError> for RecipeError {
    fn from(err: RewriteError) -> Self {
        match err {
            RewriteError::TargetMissing { file, pattern } => {
                RecipeError::RewriteTargetMissing { file, pattern }
            }
            RewriteError::Io { file, source } => {
                RecipeError::io(format!("failed to rewrite {}", file.display()), source)
            }
        }
    }
}

/// A failed invocation: the phase that failed and why.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("{stage} phase failed")]
#[diagnostic(code(quay::lifecycle))]
pub struct LifecycleError {
    pub stage: Stage,
    #[source]
    #[diagnostic_source]
    pub kind: RecipeError,
}

impl LifecycleError {
    pub fn new(stage: Stage, kind: RecipeError) -> Self {
        LifecycleError { stage, kind }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let inner = self.kind.to_diagnostic();
        Diagnostic {
            message: format!("{} phase failed: {}", self.stage, inner.message),
            ..inner
        }
    }
}

/// Collapse an error chain into one line of diagnostic text.
pub(crate) fn render(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}
