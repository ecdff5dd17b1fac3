//! Test doubles for the lifecycle's collaborators.
//!
//! The fakes record how they were called and write just enough to disk for
//! the next phase to proceed, so the full lifecycle can run without network
//! access, `git`, or `cmake`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::builder::definitions::Definitions;
use crate::builder::{BuildHandle, BuildTool};
use crate::core::requirement::Requirement;
use crate::deps::{DependencyResolver, ResolvedDependency};
use crate::ops::errors::Stage;
use crate::ops::events::{LifecycleEvent, Observer};
use crate::ops::lifecycle::Phase;
use crate::patch::apply::PatchTool;
use crate::sources::metadata::SourceDescriptor;

/// Source data with one version and no patches.
pub const SOURCE_DATA: &str = r#"
[sources."1.5.2"]
url = "https://github.com/nih-at/libzip/releases/download/rel-1-5-2/libzip-1.5.2.tar.gz"
sha256 = "be694a4abb2ffe5ec02074146757c8b56084dbcebf329123c84b205417435e15"
"#;

/// Source data with a patch; see [`write_patch_dir`].
pub const SOURCE_DATA_WITH_PATCH: &str = r#"
[sources."1.5.2"]
url = "https://github.com/nih-at/libzip/releases/download/rel-1-5-2/libzip-1.5.2.tar.gz"
sha256 = "be694a4abb2ffe5ec02074146757c8b56084dbcebf329123c84b205417435e15"

[[patches."1.5.2"]]
patch_file = "patches/0001-zip-close-permissions.patch"
base_path = "lib"
"#;

/// Upstream `CMakeLists.txt`, reduced to the lines the recipe rewrites.
pub const CMAKE_LISTS: &str = r#"CMAKE_MINIMUM_REQUIRED(VERSION 3.0.2)
PROJECT(libzip C)
IF(NOT ZLIB_VERSION_STRING)
  MESSAGE(FATAL_ERROR "-- ZLIB version too old, please install at least v1.1.2")
ENDIF()
ADD_SUBDIRECTORY(lib)
ADD_SUBDIRECTORY(man)
ADD_SUBDIRECTORY(src)
ADD_SUBDIRECTORY(regress)
ADD_SUBDIRECTORY(examples)
TARGET_LINK_LIBRARIES(zip ${OPENSSL_LIBRARIES})
"#;

/// Write the patch named in [`SOURCE_DATA_WITH_PATCH`] and return the
/// directory the source data should be parsed with.
pub fn write_patch_dir(root: &Path) -> PathBuf {
    let base = root.join("recipe");
    std::fs::create_dir_all(base.join("patches")).unwrap();
    std::fs::write(
        base.join("patches/0001-zip-close-permissions.patch"),
        "--- a/zip_close.c\n+++ b/zip_close.c\n@@ -12 +12 @@\n-    mask = umask(022);\n+    mask = umask(S_IWGRP | S_IWOTH);\n",
    )
    .unwrap();
    base
}

/// A gzip-compressed tarball with every file under `prefix/`.
pub fn tarball(prefix: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/{}", prefix, path), content.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// Fetcher that writes a small libzip tree instead of downloading.
#[derive(Debug)]
pub struct FakeFetcher {
    cmake_lists: Option<String>,
    license: bool,
    calls: Mutex<Vec<String>>,
}

impl Default for FakeFetcher {
    fn default() -> Self {
        FakeFetcher {
            cmake_lists: Some(CMAKE_LISTS.to_string()),
            license: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeFetcher {
    pub fn without_cmake() -> Self {
        FakeFetcher {
            cmake_lists: None,
            ..Self::default()
        }
    }

    /// Stage `content` as the top-level `CMakeLists.txt`.
    pub fn with_cmake_lists(content: &str) -> Self {
        FakeFetcher {
            cmake_lists: Some(content.to_string()),
            ..Self::default()
        }
    }

    pub fn without_license() -> Self {
        FakeFetcher {
            license: false,
            ..Self::default()
        }
    }

    /// The strip prefix of every fetch, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl crate::sources::fetch::Fetcher for FakeFetcher {
    fn fetch(&self, _source: &SourceDescriptor, strip_prefix: &str, dest: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(strip_prefix.to_string());

        std::fs::create_dir_all(dest.join("lib"))?;
        std::fs::write(dest.join("lib/zip.h"), "#define ZIP_EXTERN\n")?;
        if let Some(content) = &self.cmake_lists {
            std::fs::write(dest.join("CMakeLists.txt"), content)?;
        }
        if self.license {
            std::fs::write(dest.join("LICENSE"), "Copyright (C) 1999-2019 Dieter Baron and Thomas Klausner\n")?;
        }
        Ok(())
    }
}

/// Patch tool that records patches instead of applying them.
#[derive(Debug, Default)]
pub struct RecordingPatcher {
    failure: Option<String>,
    applied: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingPatcher {
    /// A patch tool whose every application fails with `message`.
    pub fn failing(message: &str) -> Self {
        RecordingPatcher {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// File name and base path of every applied patch, in order.
    pub fn applied(&self) -> Vec<(String, Option<String>)> {
        self.applied.lock().unwrap().clone()
    }
}

impl PatchTool for RecordingPatcher {
    fn apply(&self, patch_file: &Path, _source_root: &Path, base_path: Option<&str>) -> Result<()> {
        if let Some(message) = &self.failure {
            bail!("{}", message);
        }

        let name = patch_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.applied
            .lock()
            .unwrap()
            .push((name, base_path.map(str::to_string)));
        Ok(())
    }
}

/// Resolver that invents an install prefix for every requirement.
#[derive(Debug, Default)]
pub struct FakeResolver {
    missing: Option<String>,
    resolved: Mutex<Vec<String>>,
}

impl FakeResolver {
    /// A resolver for which `name` is not installed.
    pub fn missing(name: &str) -> Self {
        FakeResolver {
            missing: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Every successfully resolved requirement, in order.
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

impl DependencyResolver for FakeResolver {
    fn resolve(&self, requirement: &Requirement) -> Result<ResolvedDependency> {
        if self.missing.as_deref() == Some(requirement.name()) {
            bail!("package {} is not installed", requirement);
        }
        self.resolved.lock().unwrap().push(requirement.to_string());

        let root = PathBuf::from("/deps")
            .join(requirement.name())
            .join(requirement.version());
        Ok(ResolvedDependency {
            requirement: requirement.clone(),
            include_dirs: vec![root.join("include")],
            lib_dirs: vec![root.join("lib")],
            libs: vec![root.join(format!("lib/lib{}.a", requirement.name()))],
            root,
        })
    }
}

/// Build tool that records calls and installs a static library.
#[derive(Debug, Default)]
pub struct FakeBuildTool {
    build_failure: Option<String>,
    configure_calls: Mutex<Vec<Definitions>>,
    build_calls: Mutex<usize>,
}

impl FakeBuildTool {
    pub fn failing_build(message: &str) -> Self {
        FakeBuildTool {
            build_failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn configure_calls(&self) -> usize {
        self.configure_calls.lock().unwrap().len()
    }

    pub fn build_calls(&self) -> usize {
        *self.build_calls.lock().unwrap()
    }

    pub fn last_definitions(&self) -> Option<Definitions> {
        self.configure_calls.lock().unwrap().last().cloned()
    }
}

impl BuildTool for FakeBuildTool {
    fn name(&self) -> &str {
        "fake"
    }

    fn configure(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        definitions: &Definitions,
    ) -> Result<BuildHandle> {
        self.configure_calls
            .lock()
            .unwrap()
            .push(definitions.clone());
        Ok(BuildHandle {
            source_dir: source_dir.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            config: None,
        })
    }

    fn build(&self, _handle: &BuildHandle) -> Result<()> {
        *self.build_calls.lock().unwrap() += 1;
        if let Some(message) = &self.build_failure {
            bail!("CMake build failed:\n{}", message);
        }
        Ok(())
    }

    fn install(&self, _handle: &BuildHandle, destination: &Path) -> Result<()> {
        std::fs::create_dir_all(destination.join("lib"))?;
        std::fs::create_dir_all(destination.join("include"))?;
        std::fs::write(destination.join("lib/libzip.a"), b"!<arch>\n")?;
        std::fs::write(destination.join("include/zip.h"), "#define ZIP_EXTERN\n")?;
        Ok(())
    }
}

/// Observer that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Phases reached, in order.
    pub fn phases(&self) -> Vec<Phase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                LifecycleEvent::PhaseReached { phase, .. } => Some(phase),
                _ => None,
            })
            .collect()
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        self.events().into_iter().find_map(|event| match event {
            LifecycleEvent::LifecycleFailed { stage, .. } => Some(stage),
            _ => None,
        })
    }
}

impl Observer for RecordingObserver {
    fn on_event(&self, event: &LifecycleEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
