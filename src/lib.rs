//! quay - A declarative recipe engine for packaging native C libraries
//!
//! A recipe declares its options, requirements, build definitions, and
//! build-file rewrites as rule tables over the resolved configuration. The
//! lifecycle in [`ops::lifecycle`] drives a recipe from configuration through
//! fetching, patching, building, and packaging to a published package.

pub mod builder;
pub mod core;
pub mod deps;
pub mod ops;
pub mod patch;
pub mod recipes;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test doubles for the lifecycle's collaborators.
#[cfg(test)]
pub mod test_support;

pub use crate::core::recipe::Recipe;
pub use ops::errors::{LifecycleError, RecipeError, Stage};
pub use ops::lifecycle::{Collaborators, Phase, RecipeRunner};
pub use ops::publish::PackageOutput;
