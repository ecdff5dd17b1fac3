//! The external build tool.
//!
//! The lifecycle drives a build tool through three capabilities: configure a
//! source tree with a set of definitions, build it, and install the result
//! into a destination prefix.

pub mod cmake;
pub mod definitions;
pub mod util;

use std::path::{Path, PathBuf};

use anyhow::Result;

pub use cmake::CMakeTool;
pub use definitions::{emit_definitions, DefinitionValue, Definitions};

/// A configured build tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildHandle {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    /// Configuration to build for multi-config generators
    pub config: Option<String>,
}

/// Configure, build, and install a source tree.
pub trait BuildTool {
    fn name(&self) -> &str;

    fn configure(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        definitions: &Definitions,
    ) -> Result<BuildHandle>;

    fn build(&self, handle: &BuildHandle) -> Result<()>;

    fn install(&self, handle: &BuildHandle, destination: &Path) -> Result<()>;
}
