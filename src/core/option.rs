//! Recipe options.
//!
//! An option is a user-tunable, enumerated build choice. The recipe declares
//! each option's legal values, its default, and the platforms it applies to.
//! [`OptionSet`] holds the values for one invocation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::core::settings::{Os, Settings};

/// Build shared instead of static libraries.
pub const SHARED: &str = "shared";

/// Position independent code for static libraries.
pub const FPIC: &str = "fPIC";

/// Error reading or assigning an option.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("option `{0}` is not declared by this recipe")]
    Unknown(String),

    #[error("option `{0}` does not apply to this platform")]
    NotInScope(String),

    #[error("invalid value `{value}` for option `{name}` (possible values: {})", .legal.join(", "))]
    InvalidValue {
        name: String,
        value: String,
        legal: Vec<String>,
    },

    #[error("option `{0}` is declared more than once")]
    Duplicate(String),

    #[error("default value of option `{0}` is not one of its legal values")]
    InvalidDefault(String),
}

/// A single option value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Text(_) => None,
        }
    }

    /// Parse a raw string against a list of legal values.
    ///
    /// Booleans accept `true`/`false` in any case as well as `1`/`0`.
    pub fn parse_for(raw: &str, legal: &[OptionValue]) -> Option<OptionValue> {
        let raw = raw.trim();
        legal
            .iter()
            .find(|candidate| match candidate {
                OptionValue::Bool(true) => {
                    raw.eq_ignore_ascii_case("true") || raw == "1"
                }
                OptionValue::Bool(false) => {
                    raw.eq_ignore_ascii_case("false") || raw == "0"
                }
                OptionValue::Text(text) => text == raw,
            })
            .cloned()
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

/// Platforms an option is legal on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applicability {
    Always,
    OnlyOn(Os),
    ExceptOn(Os),
}

impl Applicability {
    /// Evaluate against the settings.
    ///
    /// Returns `None` when the predicate depends on a setting that is not set.
    pub fn evaluate(&self, settings: &Settings) -> Option<bool> {
        match self {
            Applicability::Always => Some(true),
            Applicability::OnlyOn(os) => settings.os.as_ref().map(|current| current == os),
            Applicability::ExceptOn(os) => settings.os.as_ref().map(|current| current != os),
        }
    }
}

impl fmt::Display for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Applicability::Always => f.write_str("all platforms"),
            Applicability::OnlyOn(os) => write!(f, "{} only", os),
            Applicability::ExceptOn(os) => write!(f, "all but {}", os),
        }
    }
}

/// Declaration of an option in a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDecl {
    pub name: String,
    pub legal: Vec<OptionValue>,
    pub default: OptionValue,
    pub applies: Applicability,
    pub help: String,
}

impl OptionDecl {
    /// Declare a two-valued option.
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        OptionDecl {
            name: name.into(),
            legal: vec![OptionValue::Bool(true), OptionValue::Bool(false)],
            default: OptionValue::Bool(default),
            applies: Applicability::Always,
            help: String::new(),
        }
    }

    /// Declare an option with an explicit list of choices.
    pub fn choice(name: impl Into<String>, legal: &[&str], default: &str) -> Self {
        OptionDecl {
            name: name.into(),
            legal: legal.iter().map(|s| OptionValue::from(*s)).collect(),
            default: OptionValue::from(default),
            applies: Applicability::Always,
            help: String::new(),
        }
    }

    pub fn only_on(mut self, os: Os) -> Self {
        self.applies = Applicability::OnlyOn(os);
        self
    }

    pub fn except_on(mut self, os: Os) -> Self {
        self.applies = Applicability::ExceptOn(os);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    fn legal_strings(&self) -> Vec<String> {
        self.legal.iter().map(|v| v.to_string()).collect()
    }
}

/// The option values for one recipe invocation.
///
/// Every option in scope always has a value: the set is seeded with the
/// declared defaults. Pruned options are removed together with their
/// declaration and report [`OptionError::NotInScope`] when queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    decls: BTreeMap<String, OptionDecl>,
    values: BTreeMap<String, OptionValue>,
    pruned: BTreeSet<String>,
}

impl OptionSet {
    /// Seed a set from declarations, using each option's default.
    pub fn from_declarations(decls: &[OptionDecl]) -> Result<Self, OptionError> {
        let mut set = OptionSet {
            decls: BTreeMap::new(),
            values: BTreeMap::new(),
            pruned: BTreeSet::new(),
        };

        for decl in decls {
            if !decl.legal.contains(&decl.default) {
                return Err(OptionError::InvalidDefault(decl.name.clone()));
            }
            if set.decls.insert(decl.name.clone(), decl.clone()).is_some() {
                return Err(OptionError::Duplicate(decl.name.clone()));
            }
            set.values.insert(decl.name.clone(), decl.default.clone());
        }

        Ok(set)
    }

    /// Get the value of an option in scope.
    pub fn get(&self, name: &str) -> Result<&OptionValue, OptionError> {
        if let Some(value) = self.values.get(name) {
            return Ok(value);
        }
        if self.pruned.contains(name) {
            Err(OptionError::NotInScope(name.to_string()))
        } else {
            Err(OptionError::Unknown(name.to_string()))
        }
    }

    /// Whether the option is in scope and set to `true`.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.values.get(name).and_then(OptionValue::as_bool) == Some(true)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Whether the option was declared but removed for this platform.
    pub fn is_pruned(&self, name: &str) -> bool {
        self.pruned.contains(name)
    }

    /// Assign a value, validated against the declaration.
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), OptionError> {
        let decl = self.declaration_in_scope(name)?;
        if !decl.legal.contains(&value) {
            return Err(OptionError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
                legal: decl.legal_strings(),
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Assign a value parsed from a raw string.
    pub fn set_raw(&mut self, name: &str, raw: &str) -> Result<(), OptionError> {
        let decl = self.declaration_in_scope(name)?;
        let value = OptionValue::parse_for(raw, &decl.legal).ok_or_else(|| {
            OptionError::InvalidValue {
                name: name.to_string(),
                value: raw.to_string(),
                legal: decl.legal_strings(),
            }
        })?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Remove an option from scope.
    pub(crate) fn prune(&mut self, name: &str) {
        if self.decls.remove(name).is_some() {
            self.values.remove(name);
            self.pruned.insert(name.to_string());
        }
    }

    /// Declarations of options currently in scope.
    pub fn declarations(&self) -> impl Iterator<Item = &OptionDecl> {
        self.decls.values()
    }

    pub fn declaration(&self, name: &str) -> Option<&OptionDecl> {
        self.decls.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn declaration_in_scope(&self, name: &str) -> Result<&OptionDecl, OptionError> {
        match self.decls.get(name) {
            Some(decl) => Ok(decl),
            None if self.pruned.contains(name) => Err(OptionError::NotInScope(name.to_string())),
            None => Err(OptionError::Unknown(name.to_string())),
        }
    }
}

impl Serialize for OptionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decls() -> Vec<OptionDecl> {
        vec![
            OptionDecl::boolean(SHARED, false),
            OptionDecl::boolean(FPIC, true).except_on(Os::Windows),
            OptionDecl::choice("backend", &["native", "cmake"], "cmake"),
        ]
    }

    #[test]
    fn test_seeded_with_defaults() {
        let set = OptionSet::from_declarations(&decls()).unwrap();
        assert_eq!(set.get(SHARED).unwrap(), &OptionValue::Bool(false));
        assert!(set.is_enabled(FPIC));
        assert_eq!(set.get("backend").unwrap(), &OptionValue::from("cmake"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_set_raw_validates_against_legal_values() {
        let mut set = OptionSet::from_declarations(&decls()).unwrap();
        set.set_raw(SHARED, "True").unwrap();
        assert!(set.is_enabled(SHARED));

        set.set_raw("backend", "native").unwrap();
        assert_eq!(set.get("backend").unwrap().to_string(), "native");

        let err = set.set_raw("backend", "meson").unwrap_err();
        assert!(matches!(err, OptionError::InvalidValue { .. }));
        assert!(err.to_string().contains("native, cmake"));

        assert_eq!(
            set.set_raw("with_lzma", "true"),
            Err(OptionError::Unknown("with_lzma".to_string()))
        );
    }

    #[test]
    fn test_pruned_option_is_not_queryable() {
        let mut set = OptionSet::from_declarations(&decls()).unwrap();
        set.prune(FPIC);

        assert!(!set.contains(FPIC));
        assert!(!set.is_enabled(FPIC));
        assert!(set.is_pruned(FPIC));
        assert_eq!(set.get(FPIC), Err(OptionError::NotInScope(FPIC.to_string())));
        assert_eq!(
            set.set(FPIC, OptionValue::Bool(false)),
            Err(OptionError::NotInScope(FPIC.to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_declarations() {
        let duplicate = vec![OptionDecl::boolean(SHARED, false), OptionDecl::boolean(SHARED, true)];
        assert_eq!(
            OptionSet::from_declarations(&duplicate),
            Err(OptionError::Duplicate(SHARED.to_string()))
        );

        let bad_default = vec![OptionDecl::choice("backend", &["native"], "cmake")];
        assert_eq!(
            OptionSet::from_declarations(&bad_default),
            Err(OptionError::InvalidDefault("backend".to_string()))
        );
    }

    #[test]
    fn test_applicability_without_os() {
        let settings = Settings::default();
        assert_eq!(Applicability::Always.evaluate(&settings), Some(true));
        assert_eq!(Applicability::OnlyOn(Os::Windows).evaluate(&settings), None);

        let mut linux = Settings::default();
        linux.set("os", "Linux").unwrap();
        assert_eq!(Applicability::OnlyOn(Os::Windows).evaluate(&linux), Some(false));
        assert_eq!(Applicability::ExceptOn(Os::Windows).evaluate(&linux), Some(true));
    }
}
