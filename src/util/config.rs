//! Configuration file support for quay.
//!
//! quay reads two configuration files:
//! - Global: `~/.quay/config.toml` - User-wide defaults
//! - Project: `.quay/config.toml` - Overrides for the current directory
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// quay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub build: BuildConfig,

    pub paths: PathsConfig,

    pub net: NetConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// CMake generator (e.g. "Ninja")
    pub generator: Option<String>,

    /// Parallel build jobs (None = let the build tool decide)
    pub jobs: Option<usize>,

    /// Default `build_type` setting when none is given
    pub build_type: Option<String>,
}

/// Directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Where sources are staged and packages are published
    pub work_dir: Option<PathBuf>,

    /// Root of installed dependencies (`<root>/<name>/<version>`)
    pub deps_root: Option<PathBuf>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetConfig {
    /// Offline mode (don't fetch from network)
    pub offline: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration if the file exists. A file that exists but does
    /// not parse is an error.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.generator.is_some() {
            self.build.generator = other.build.generator;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.build_type.is_some() {
            self.build.build_type = other.build.build_type;
        }

        if other.paths.work_dir.is_some() {
            self.paths.work_dir = other.paths.work_dir;
        }
        if other.paths.deps_root.is_some() {
            self.paths.deps_root = other.paths.deps_root;
        }

        if other.net.offline {
            self.net.offline = true;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.quay/config.toml)
/// 2. Global config (~/.quay/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    for path in global_path.into_iter().chain([project_path]) {
        if let Some(found) = Config::load_if_exists(path)? {
            tracing::debug!("loaded config from {}", path.display());
            config.merge(found);
        }
    }

    Ok(config)
}

/// Get the global quay config directory (~/.quay).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".quay"))
}

/// Get the global config path (~/.quay/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Per-user cache directory, the default home of work trees and installed
/// dependencies.
pub fn default_cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "quay").map(|d| d.cache_dir().to_path_buf())
}

/// Get the project config path (.quay/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".quay").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.build.generator.is_none());
        assert!(config.paths.work_dir.is_none());
        assert!(!config.net.offline);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
generator = "Ninja"
jobs = 8
build_type = "Debug"

[paths]
deps_root = "/opt/quay/deps"

[net]
offline = true
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.build.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.build.jobs, Some(8));
        assert_eq!(config.build.build_type.as_deref(), Some("Debug"));
        assert_eq!(config.paths.deps_root, Some(PathBuf::from("/opt/quay/deps")));
        assert!(config.net.offline);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[build\njobs = ").unwrap();

        let err = load_config(None, &config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse config file"));

        // Misspelled keys are rejected rather than ignored
        std::fs::write(&config_path, "[build]\nbuid_type = \"Debug\"\n").unwrap();
        let err = load_config(None, &config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("buid_type"));
    }

    #[test]
    fn test_missing_config_is_default() {
        let tmp = TempDir::new().unwrap();
        assert!(Config::load_if_exists(&tmp.path().join("none.toml"))
            .unwrap()
            .is_none());
        let config = load_config(None, &tmp.path().join("none.toml")).unwrap();
        assert!(config.build.build_type.is_none());
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[build]
generator = "Unix Makefiles"
jobs = 4
"#,
        )
        .unwrap();
        std::fs::write(
            &project_path,
            r#"
[build]
generator = "Ninja"
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path).unwrap();
        assert_eq!(config.build.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.build.jobs, Some(4));
    }
}
