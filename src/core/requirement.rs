//! Requirements on other packaged components.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A dependency on another package, pinned to an exact version.
///
/// Written as `name/version`, e.g. `zlib/1.2.11`. Versions are opaque strings
/// because upstream projects do not follow semver (`openssl/1.0.2u`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Requirement {
    name: String,
    version: String,
}

impl Requirement {
    /// Create a requirement, validating the name and version.
    pub fn new(name: &str, version: &str) -> Result<Self> {
        validate_package_name(name)?;
        validate_version(version)?;
        Ok(Requirement {
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    /// Requirement built from constants in a built-in recipe. Names are
    /// checked again by `Recipe::validate`.
    pub(crate) fn pinned(name: &'static str, version: &'static str) -> Self {
        Requirement {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl FromStr for Requirement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((name, version)) = s.split_once('/') else {
            bail!("invalid requirement `{}`: expected `name/version`", s);
        };
        Requirement::new(name, version)
    }
}

impl TryFrom<String> for Requirement {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Requirement> for String {
    fn from(req: Requirement) -> Self {
        req.to_string()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Validate a package name.
///
/// Package names must be non-empty, start with a lowercase letter, and
/// contain only `[a-z0-9_-]`.
pub fn validate_package_name(name: &str) -> Result<()> {
    let Some(first) = name.chars().next() else {
        bail!("package name cannot be empty");
    };

    if !first.is_ascii_lowercase() {
        bail!(
            "invalid package name '{}': must start with lowercase letter [a-z]",
            name
        );
    }

    if let Some(c) = name
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '_' | '-'))
    {
        bail!(
            "invalid package name '{}': only [a-z0-9_-] allowed, found '{}'",
            name,
            c
        );
    }

    Ok(())
}

pub(crate) fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        bail!("version cannot be empty");
    }
    if !version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
    {
        bail!("invalid version '{}'", version);
    }
    Ok(())
}
