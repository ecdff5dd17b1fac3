//! Platform settings: operating system, compiler, build type and architecture.
//!
//! Settings describe the platform a package is built for. They are supplied by
//! the caller, never chosen by the recipe, and are validated when assigned.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error assigning a setting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting `{0}` (expected os, arch, build_type, compiler, compiler.version, compiler.libcxx or compiler.cppstd)")]
    UnknownKey(String),

    #[error("setting `{0}` cannot be empty")]
    EmptyValue(String),

    #[error("invalid build_type `{0}` (expected Debug, Release, RelWithDebInfo or MinSizeRel)")]
    InvalidBuildType(String),

    #[error("expected `key=value`, got `{0}`")]
    MalformedAssignment(String),
}

/// Target operating system.
///
/// Unrecognized names are kept as [`Os::Other`] rather than rejected, so new
/// platforms can be passed through without a release of this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Os {
    Windows,
    Linux,
    Macos,
    FreeBsd,
    Android,
    Ios,
    Other(String),
}

impl Os {
    /// Canonical spelling of the OS name.
    pub fn as_str(&self) -> &str {
        match self {
            Os::Windows => "Windows",
            Os::Linux => "Linux",
            Os::Macos => "Macos",
            Os::FreeBsd => "FreeBSD",
            Os::Android => "Android",
            Os::Ios => "iOS",
            Os::Other(name) => name,
        }
    }

    /// Detect the host operating system.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "windows" => Os::Windows,
            "linux" => Os::Linux,
            "macos" => Os::Macos,
            "freebsd" => Os::FreeBsd,
            "android" => Os::Android,
            "ios" => Os::Ios,
            other => Os::Other(other.to_string()),
        }
    }
}

impl From<&str> for Os {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Os::Windows,
            "linux" => Os::Linux,
            "macos" | "darwin" => Os::Macos,
            "freebsd" => Os::FreeBsd,
            "android" => Os::Android,
            "ios" => Os::Ios,
            _ => Os::Other(s.to_string()),
        }
    }
}

impl From<String> for Os {
    fn from(s: String) -> Self {
        Os::from(s.as_str())
    }
}

impl From<Os> for String {
    fn from(os: Os) -> Self {
        os.as_str().to_string()
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl FromStr for BuildType {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
            "minsizerel" => Ok(BuildType::MinSizeRel),
            _ => Err(SettingsError::InvalidBuildType(s.to_string())),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler setting and its sub-dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compiler {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// C++ standard library dialect (libstdc++, libstdc++11, libc++, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libcxx: Option<String>,

    /// C++ language standard level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cppstd: Option<String>,
}

/// The full platform settings for one recipe invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<Os>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    #[serde(default)]
    pub compiler: Compiler,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_type: Option<BuildType>,
}

impl Settings {
    /// Settings describing the host, with a release build type.
    pub fn host() -> Self {
        Settings {
            os: Some(Os::host()),
            arch: Some(std::env::consts::ARCH.to_string()),
            compiler: Compiler::default(),
            build_type: Some(BuildType::Release),
        }
    }

    /// Assign a single setting by its dotted key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SettingsError::EmptyValue(key.to_string()));
        }

        match key {
            "os" => self.os = Some(Os::from(value)),
            "arch" => self.arch = Some(value.to_string()),
            "build_type" => self.build_type = Some(value.parse()?),
            "compiler" => self.compiler.name = Some(value.to_string()),
            "compiler.version" => self.compiler.version = Some(value.to_string()),
            "compiler.libcxx" => self.compiler.libcxx = Some(value.to_string()),
            "compiler.cppstd" => self.compiler.cppstd = Some(value.to_string()),
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }

        Ok(())
    }

    /// Assign a setting from a `key=value` string.
    pub fn set_assignment(&mut self, assignment: &str) -> Result<(), SettingsError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| SettingsError::MalformedAssignment(assignment.to_string()))?;
        self.set(key.trim(), value)
    }

    /// Whether the target OS is Windows.
    pub fn is_windows(&self) -> bool {
        self.os == Some(Os::Windows)
    }

    /// Flattened `(key, value)` pairs in a stable order, for fingerprinting.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        if let Some(os) = &self.os {
            entries.push(("os", os.to_string()));
        }
        if let Some(arch) = &self.arch {
            entries.push(("arch", arch.clone()));
        }
        if let Some(build_type) = self.build_type {
            entries.push(("build_type", build_type.to_string()));
        }
        if let Some(name) = &self.compiler.name {
            entries.push(("compiler", name.clone()));
        }
        if let Some(version) = &self.compiler.version {
            entries.push(("compiler.version", version.clone()));
        }
        if let Some(libcxx) = &self.compiler.libcxx {
            entries.push(("compiler.libcxx", libcxx.clone()));
        }
        if let Some(cppstd) = &self.compiler.cppstd {
            entries.push(("compiler.cppstd", cppstd.clone()));
        }
        entries
    }
}
