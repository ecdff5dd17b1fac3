//! High-level operations.
//!
//! This module contains the recipe lifecycle and the pieces it is made of.

pub mod errors;
pub mod events;
pub mod layout;
pub mod lifecycle;
pub mod plan;
pub mod publish;

pub use errors::{LifecycleError, RecipeError, Stage};
pub use events::{LifecycleEvent, NullObserver, Observer};
pub use layout::Layout;
pub use lifecycle::{Collaborators, Phase, RecipeRunner};
pub use plan::{configure_recipe, plan, Configured, Plan};
pub use publish::{PackageOutput, PACKAGE_INFO_FILE};
