//! Build configuration: the flat definition map handed to the build tool.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::core::option::{OptionValue, FPIC, SHARED};
use crate::core::rules::{DefinitionRule, DefinitionSource};
use crate::resolver::ResolvedConfig;

/// Value of a single definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DefinitionValue {
    Bool(bool),
    Text(String),
}

impl DefinitionValue {
    /// Render the value the way CMake expects it on the command line.
    pub fn to_cmake(&self) -> String {
        match self {
            DefinitionValue::Bool(true) => "ON".to_string(),
            DefinitionValue::Bool(false) => "OFF".to_string(),
            DefinitionValue::Text(s) => s.clone(),
        }
    }
}

impl From<bool> for DefinitionValue {
    fn from(b: bool) -> Self {
        DefinitionValue::Bool(b)
    }
}

impl From<&str> for DefinitionValue {
    fn from(s: &str) -> Self {
        DefinitionValue::Text(s.to_string())
    }
}

impl From<String> for DefinitionValue {
    fn from(s: String) -> Self {
        DefinitionValue::Text(s)
    }
}

impl From<&OptionValue> for DefinitionValue {
    fn from(value: &OptionValue) -> Self {
        match value {
            OptionValue::Bool(b) => DefinitionValue::Bool(*b),
            OptionValue::Text(s) => DefinitionValue::Text(s.clone()),
        }
    }
}

impl fmt::Display for DefinitionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cmake())
    }
}

/// Ordered mapping from definition name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Definitions(BTreeMap<String, DefinitionValue>);

impl Definitions {
    pub fn new() -> Self {
        Definitions(BTreeMap::new())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<DefinitionValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&DefinitionValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefinitionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into this map; entries from `other` win.
    pub fn merged(mut self, other: &Definitions) -> Self {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
        self
    }

    /// `-DNAME=VALUE` arguments in name order.
    pub fn to_cmake_args(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(name, value)| format!("-D{}={}", name, value.to_cmake()))
            .collect()
    }
}

/// Emit the build configuration for a resolved configuration.
///
/// The result depends only on `rules` and `config`, so calling this twice
/// yields equal maps.
pub fn emit_definitions(rules: &[DefinitionRule], config: &ResolvedConfig) -> Definitions {
    let mut defs = standard_definitions(config);

    for rule in rules {
        if !rule.when.holds(config) {
            continue;
        }

        match &rule.value {
            DefinitionSource::Fixed(value) => defs.set(rule.name.clone(), value.clone()),
            DefinitionSource::Option(option) => {
                if let Ok(value) = config.options.get(option) {
                    defs.set(rule.name.clone(), DefinitionValue::from(value));
                }
            }
        }
    }

    defs
}

/// Definitions every CMake-built package gets from its options and settings.
fn standard_definitions(config: &ResolvedConfig) -> Definitions {
    let mut defs = Definitions::new();

    if let Some(build_type) = config.settings.build_type {
        defs.set("CMAKE_BUILD_TYPE", build_type.as_str());
    }
    if let Ok(shared) = config.options.get(SHARED) {
        defs.set("BUILD_SHARED_LIBS", DefinitionValue::from(shared));
    }
    if let Ok(fpic) = config.options.get(FPIC) {
        defs.set("CMAKE_POSITION_INDEPENDENT_CODE", DefinitionValue::from(fpic));
    }

    defs
}
