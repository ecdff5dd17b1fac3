//! Source patching and build-file rewriting.

pub mod apply;
pub mod pipeline;
pub mod rewrite;

pub use apply::{GitApply, PatchTool};
pub use pipeline::{run_pipeline, PipelineReport};
pub use rewrite::{Replacement, RewriteError, TextEdit};
