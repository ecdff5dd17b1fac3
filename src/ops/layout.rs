//! On-disk layout of one invocation.
//!
//! ```text
//! <work>/<name>/<version>/<fingerprint>/
//!     source_subfolder/     staged, patched upstream tree
//!     build_subfolder/      build tree
//!     package.staging/      install destination while packaging
//!     package/              published package (renamed from package.staging)
//! ```
//!
//! The fingerprint covers the resolved options and settings, so invocations
//! with different configurations never share a directory.

use std::path::{Path, PathBuf};

use crate::resolver::ResolvedConfig;
use crate::util::hash::Fingerprint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(work_dir: &Path, name: &str, version: &str, fingerprint: &str) -> Self {
        Layout {
            root: work_dir.join(name).join(version).join(fingerprint),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join("source_subfolder")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build_subfolder")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("package.staging")
    }

    pub fn package_dir(&self) -> PathBuf {
        self.root.join("package")
    }
}

/// Short fingerprint of a resolved configuration.
pub fn config_fingerprint(config: &ResolvedConfig) -> String {
    let mut fp = Fingerprint::new();

    fp.section("options");
    for (name, value) in config.options.iter() {
        fp.update_pair(name, &value.to_string());
    }
    fp.section("settings");
    for (key, value) in config.settings.entries() {
        fp.update_pair(key, &value);
    }

    fp.finish_short()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::option::{OptionDecl, OptionSet};
    use crate::core::settings::Settings;

    fn config(shared: bool, os: &str) -> ResolvedConfig {
        let mut options =
            OptionSet::from_declarations(&[OptionDecl::boolean("shared", false)]).unwrap();
        options.set("shared", shared.into()).unwrap();
        let mut settings = Settings::default();
        settings.set("os", os).unwrap();
        ResolvedConfig { options, settings }
    }

    #[test]
    fn test_layout_paths() {
        let layout = Layout::new(Path::new("/work"), "libzip", "1.5.2", "abcd");
        assert_eq!(layout.root(), Path::new("/work/libzip/1.5.2/abcd"));
        assert_eq!(
            layout.source_dir(),
            Path::new("/work/libzip/1.5.2/abcd/source_subfolder")
        );
        assert_eq!(
            layout.package_dir(),
            Path::new("/work/libzip/1.5.2/abcd/package")
        );
    }

    #[test]
    fn test_fingerprint_tracks_configuration() {
        assert_eq!(
            config_fingerprint(&config(false, "Linux")),
            config_fingerprint(&config(false, "Linux"))
        );
        assert_ne!(
            config_fingerprint(&config(false, "Linux")),
            config_fingerprint(&config(true, "Linux"))
        );
        assert_ne!(
            config_fingerprint(&config(false, "Linux")),
            config_fingerprint(&config(false, "Windows"))
        );
    }
}
