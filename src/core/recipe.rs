//! Recipe declarations.

use std::collections::HashSet;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::core::option::OptionDecl;
use crate::core::requirement::{validate_package_name, validate_version};
use crate::core::rules::{DefinitionRule, RequirementRule, RewriteRule, SystemLibRule};

/// Descriptive metadata of a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipeMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub license: String,
    pub homepage: String,
    pub url: String,
    pub topics: Vec<String>,
}

/// A complete recipe: metadata, option domain, and rule tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub metadata: RecipeMetadata,

    pub options: Vec<OptionDecl>,

    /// Requirement rules, baseline first.
    pub requirements: Vec<RequirementRule>,

    pub definitions: Vec<DefinitionRule>,

    /// Build-file rewrites, applied in order after patches.
    pub rewrites: Vec<RewriteRule>,

    pub system_libs: Vec<SystemLibRule>,

    /// Glob for license files, relative to the staged source root.
    pub license_pattern: String,
}

impl Recipe {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// The default version built by this recipe.
    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// Check the rule tables for internal consistency.
    pub fn validate(&self) -> Result<()> {
        validate_package_name(&self.metadata.name)?;

        let declared: HashSet<&str> = self.options.iter().map(|o| o.name.as_str()).collect();

        let mut seen = HashSet::new();
        for rule in &self.requirements {
            let name = rule.requirement.name();
            validate_package_name(name)?;
            validate_version(rule.requirement.version())?;
            if name == self.metadata.name {
                bail!("recipe `{}` cannot require itself", name);
            }
            if !seen.insert(name) {
                bail!("requirement `{}` appears more than once", name);
            }
        }

        if !self.requirements.iter().any(RequirementRule::is_unconditional) {
            bail!("recipe `{}` declares no baseline requirement", self.metadata.name);
        }

        let mut definitions = HashSet::new();
        for rule in &self.definitions {
            if !definitions.insert(rule.name.as_str()) {
                bail!("definition `{}` is declared more than once", rule.name);
            }
            if let crate::core::rules::DefinitionSource::Option(option) = &rule.value {
                if !declared.contains(option.as_str()) {
                    bail!(
                        "definition `{}` reads undeclared option `{}`",
                        rule.name,
                        option
                    );
                }
            }
        }

        for rule in &self.rewrites {
            if rule.edit.find.is_empty() {
                bail!("rewrite of {} has an empty search text", rule.file.display());
            }
        }

        Ok(())
    }
}
