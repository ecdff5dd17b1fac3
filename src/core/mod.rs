//! Core data structures for quay.
//!
//! - Options and settings, the inputs of every invocation
//! - Requirements on other packages
//! - Rule tables and the recipe that carries them

pub mod option;
pub mod recipe;
pub mod requirement;
pub mod rules;
pub mod settings;

pub use option::{OptionDecl, OptionError, OptionSet, OptionValue};
pub use recipe::{Recipe, RecipeMetadata};
pub use requirement::Requirement;
pub use rules::{Condition, DefinitionRule, RequirementRule, RewriteRule, SystemLibRule};
pub use settings::{Os, Settings, SettingsError};
