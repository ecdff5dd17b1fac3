//! Dependency resolution.
//!
//! Requirements are resolved to installed packages and made visible to the
//! build tool through a generated CMake script. The script defines one pair of
//! variables per dependency:
//!
//! - `QUAY_LIBS_<NAME>`: the full paths of the dependency's libraries
//! - `QUAY_INCLUDE_DIRS_<NAME>`: its include directories
//!
//! `<NAME>` is the package name upper-cased with `-` replaced by `_`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Serialize;

use crate::builder::definitions::Definitions;
use crate::builder::util::find_library_files;
use crate::core::requirement::Requirement;
use crate::util::fs::write_string;

/// File name of the generated CMake script.
pub const BUILD_INFO_FILE: &str = "quaybuildinfo.cmake";

/// A requirement resolved to an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub requirement: Requirement,
    /// Install prefix of the package
    pub root: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub lib_dirs: Vec<PathBuf>,
    /// Full paths of the package's libraries
    pub libs: Vec<PathBuf>,
}

/// Resolves requirements and exposes them to the build tool.
pub trait DependencyResolver {
    fn resolve(&self, requirement: &Requirement) -> Result<ResolvedDependency>;

    /// Name of the variable holding a package's libraries.
    fn libs_variable(&self, package: &str) -> String {
        format!("QUAY_LIBS_{}", variable_suffix(package))
    }

    /// Name of the variable holding a package's include directories.
    fn include_variable(&self, package: &str) -> String {
        format!("QUAY_INCLUDE_DIRS_{}", variable_suffix(package))
    }

    /// Write the build info script into `build_dir` and return the
    /// definitions that make the build tool load it.
    fn expose(&self, deps: &[ResolvedDependency], build_dir: &Path) -> Result<Definitions> {
        let script = build_dir.join(BUILD_INFO_FILE);
        write_string(&script, &self.render_build_info(deps))?;

        let mut defs = Definitions::new();
        defs.set("CMAKE_PROJECT_INCLUDE", cmake_path(&script));
        if !deps.is_empty() {
            let prefixes: Vec<String> = deps.iter().map(|d| cmake_path(&d.root)).collect();
            defs.set("CMAKE_PREFIX_PATH", prefixes.join(";"));
        }
        Ok(defs)
    }

    fn render_build_info(&self, deps: &[ResolvedDependency]) -> String {
        let mut out = String::from("# Generated by quay. Do not edit.\n\n");

        for dep in deps {
            let name = dep.requirement.name();
            out.push_str(&format!("# {}\n", dep.requirement));
            out.push_str(&format!(
                "set({} {})\n",
                self.include_variable(name),
                cmake_list(&dep.include_dirs)
            ));
            out.push_str(&format!(
                "set({} {})\n",
                self.libs_variable(name),
                cmake_list(&dep.libs)
            ));
            out.push_str(&format!(
                "include_directories(${{{}}})\n",
                self.include_variable(name)
            ));
            if !dep.lib_dirs.is_empty() {
                out.push_str(&format!("link_directories({})\n", cmake_list(&dep.lib_dirs)));
            }
            out.push('\n');
        }

        out
    }
}

/// Resolves `<name>/<version>` to `<root>/<name>/<version>` with the usual
/// `include/` and `lib/` subdirectories.
#[derive(Debug, Clone)]
pub struct PrefixResolver {
    root: PathBuf,
}

impl PrefixResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PrefixResolver { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DependencyResolver for PrefixResolver {
    fn resolve(&self, requirement: &Requirement) -> Result<ResolvedDependency> {
        let prefix = self
            .root
            .join(requirement.name())
            .join(requirement.version());

        if !prefix.is_dir() {
            bail!(
                "`{}` is not installed (looked in {})",
                requirement,
                prefix.display()
            );
        }

        let include = prefix.join("include");
        let lib = prefix.join("lib");
        let libs = find_library_files(&lib)?;
        if libs.is_empty() {
            bail!("`{}` has no libraries in {}", requirement, lib.display());
        }

        tracing::debug!("resolved {} to {}", requirement, prefix.display());

        Ok(ResolvedDependency {
            requirement: requirement.clone(),
            include_dirs: if include.is_dir() { vec![include] } else { Vec::new() },
            lib_dirs: vec![lib],
            libs,
            root: prefix,
        })
    }
}

fn variable_suffix(package: &str) -> String {
    package.to_ascii_uppercase().replace(['-', '.'], "_")
}

/// CMake wants forward slashes on every platform.
fn cmake_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

fn cmake_list(paths: &[PathBuf]) -> String {
    let items: Vec<String> = paths.iter().map(|p| cmake_path(p)).collect();
    format!("\"{}\"", items.join(";"))
}
