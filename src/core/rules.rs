//! Declarative rule tables.
//!
//! A recipe's conditional behavior is data: each rule pairs a [`Condition`]
//! over the resolved configuration with an effect (a requirement, a build
//! definition, a build-file rewrite, or a system library). Rules are evaluated
//! once per invocation, in declaration order.

use std::path::PathBuf;

use crate::builder::definitions::DefinitionValue;
use crate::core::requirement::Requirement;
use crate::core::settings::Os;
use crate::patch::rewrite::TextEdit;
use crate::resolver::ResolvedConfig;

/// Predicate over a resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Always,
    /// The option is in scope and `true`.
    Enabled(String),
    /// The target OS is known and equal.
    OsIs(Os),
    All(Vec<Condition>),
}

impl Condition {
    pub fn enabled(option: impl Into<String>) -> Self {
        Condition::Enabled(option.into())
    }

    pub fn os(os: Os) -> Self {
        Condition::OsIs(os)
    }

    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::All(mut all) => {
                all.push(other);
                Condition::All(all)
            }
            Condition::Always => other,
            cond => Condition::All(vec![cond, other]),
        }
    }

    pub fn holds(&self, config: &ResolvedConfig) -> bool {
        match self {
            Condition::Always => true,
            Condition::Enabled(name) => config.options.is_enabled(name),
            Condition::OsIs(os) => config.settings.os.as_ref() == Some(os),
            Condition::All(all) => all.iter().all(|c| c.holds(config)),
        }
    }
}

/// A requirement added when its condition holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementRule {
    pub requirement: Requirement,
    pub when: Condition,
}

impl RequirementRule {
    /// A requirement that is always present.
    pub fn always(requirement: Requirement) -> Self {
        RequirementRule {
            requirement,
            when: Condition::Always,
        }
    }

    pub fn when(requirement: Requirement, when: Condition) -> Self {
        RequirementRule { requirement, when }
    }

    pub fn is_unconditional(&self) -> bool {
        self.when == Condition::Always
    }
}

/// Where a definition's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionSource {
    /// The current value of an option. No definition is emitted when the
    /// option is out of scope.
    Option(String),
    Fixed(DefinitionValue),
}

/// A build-tool definition emitted when its condition holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionRule {
    pub name: String,
    pub value: DefinitionSource,
    pub when: Condition,
}

impl DefinitionRule {
    pub fn from_option(name: impl Into<String>, option: impl Into<String>) -> Self {
        DefinitionRule {
            name: name.into(),
            value: DefinitionSource::Option(option.into()),
            when: Condition::Always,
        }
    }

    pub fn fixed(name: impl Into<String>, value: impl Into<DefinitionValue>) -> Self {
        DefinitionRule {
            name: name.into(),
            value: DefinitionSource::Fixed(value.into()),
            when: Condition::Always,
        }
    }

    pub fn only_when(mut self, when: Condition) -> Self {
        self.when = when;
        self
    }
}

/// A text edit applied to a file of the staged source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    /// Path relative to the staged source root.
    pub file: PathBuf,
    pub edit: TextEdit,
    pub when: Condition,
}

impl RewriteRule {
    pub fn new(file: impl Into<PathBuf>, edit: TextEdit) -> Self {
        RewriteRule {
            file: file.into(),
            edit,
            when: Condition::Always,
        }
    }

    pub fn only_when(mut self, when: Condition) -> Self {
        self.when = when;
        self
    }
}

/// A system library consumers must link when its condition holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemLibRule {
    pub name: String,
    pub when: Condition,
}
