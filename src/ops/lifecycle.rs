//! The recipe lifecycle.
//!
//! One invocation moves forward through a fixed sequence of phases:
//!
//! ```text
//! Created -> Configured -> RequirementsResolved -> Sourced -> Patched
//!         -> Built -> Packaged -> Published
//! ```
//!
//! The first failure stops the invocation and is reported with the stage it
//! happened in. There are no retries, and nothing is published unless every
//! phase succeeded.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::builder::definitions::Definitions;
use crate::builder::BuildTool;
use crate::core::recipe::Recipe;
use crate::core::requirement::Requirement;
use crate::core::settings::Settings;
use crate::deps::{DependencyResolver, ResolvedDependency};
use crate::ops::errors::{render, LifecycleError, RecipeError, Stage};
use crate::ops::events::{LifecycleEvent, NullObserver, Observer};
use crate::ops::layout::{config_fingerprint, Layout};
use crate::ops::plan::{configure_recipe, Configured};
use crate::ops::publish::{copy_license, publish, scan_libs, system_libs, PackageOutput};
use crate::patch::apply::PatchTool;
use crate::patch::pipeline::run_pipeline;
use crate::resolver::plan_requirements;
use crate::sources::fetch::Fetcher;
use crate::sources::metadata::SourceData;
use crate::sources::stage::stage_source;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Created,
    Configured,
    RequirementsResolved,
    Sourced,
    Patched,
    Built,
    Packaged,
    Published,
    Failed(Stage),
}

/// The external mechanisms the lifecycle drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub patcher: &'a dyn PatchTool,
    pub resolver: &'a dyn DependencyResolver,
    pub build_tool: &'a dyn BuildTool,
}

/// Runs one recipe invocation.
pub struct RecipeRunner<'a> {
    recipe: &'a Recipe,
    source_data: &'a SourceData,
    version: String,
    work_dir: PathBuf,
    tools: Collaborators<'a>,
    observer: &'a dyn Observer,
    phase: Phase,
    phase_started: Instant,
}

impl<'a> RecipeRunner<'a> {
    pub fn new(recipe: &'a Recipe, source_data: &'a SourceData, tools: Collaborators<'a>) -> Self {
        RecipeRunner {
            recipe,
            source_data,
            version: recipe.version().to_string(),
            work_dir: PathBuf::from("."),
            tools,
            observer: &NullObserver,
            phase: Phase::Created,
            phase_started: Instant::now(),
        }
    }

    /// Build a version other than the recipe's default.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Root directory for staged sources, build trees, and packages.
    pub fn work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn observer(mut self, observer: &'a dyn Observer) -> Self {
        self.observer = observer;
        self
    }

    /// Run every phase with the given option overrides and settings.
    pub fn run(
        mut self,
        overrides: &[(String, String)],
        settings: Settings,
    ) -> Result<PackageOutput, LifecycleError> {
        tracing::info!("Creating {}/{}", self.recipe.name(), self.version);

        match self.run_phases(overrides, &settings) {
            Ok(output) => Ok(output),
            Err(err) => {
                self.phase = Phase::Failed(err.stage);
                tracing::debug!("lifecycle stopped in {} phase", err.stage);
                self.observer.on_event(&LifecycleEvent::failed(&err));
                Err(err)
            }
        }
    }

    fn advance(&mut self, phase: Phase) {
        let duration_ms = self.phase_started.elapsed().as_millis() as u64;
        tracing::debug!("{:?} -> {:?} ({} ms)", self.phase, phase, duration_ms);

        self.phase = phase;
        self.phase_started = Instant::now();
        self.observer
            .on_event(&LifecycleEvent::PhaseReached { phase, duration_ms });
    }

    fn run_phases(
        &mut self,
        overrides: &[(String, String)],
        settings: &Settings,
    ) -> Result<PackageOutput, LifecycleError> {
        let at = |stage: Stage| move |kind: RecipeError| LifecycleError::new(stage, kind);
        let (recipe, source_data, tools) = (self.recipe, self.source_data, self.tools);

        // Configure
        let configured = configure_recipe(
            recipe,
            source_data,
            &self.version,
            overrides,
            settings,
        )
        .map_err(at(Stage::Configure))?;
        let entry = configured.entry;
        let layout = Layout::new(
            &self.work_dir,
            recipe.name(),
            &self.version,
            &config_fingerprint(&configured.config),
        );
        self.advance(Phase::Configured);

        // Requirements
        let requires = plan_requirements(&recipe.requirements, &configured.config);
        let deps = resolve_requirements(tools.resolver, &requires)
            .map_err(at(Stage::Requirements))?;
        self.advance(Phase::RequirementsResolved);

        // Source
        let source_dir = stage_source(tools.fetcher, recipe.name(), &entry, &layout.source_dir())
            .map_err(|e| RecipeError::Fetch {
                url: entry.source.url.clone(),
                diagnostic: render(&e),
            })
            .map_err(at(Stage::Source))?;
        self.advance(Phase::Sourced);

        // Patch
        let report = run_pipeline(
            &source_dir,
            source_data,
            &entry,
            &recipe.rewrites,
            &configured.config,
            tools.patcher,
            tools.resolver,
        )
        .map_err(at(Stage::Patch))?;
        for patch in report.patches {
            self.observer.on_event(&LifecycleEvent::PatchApplied { patch });
        }
        for (file, pattern, count) in report.rewrites {
            self.observer.on_event(&LifecycleEvent::RewriteApplied {
                file,
                pattern,
                count,
            });
        }
        self.advance(Phase::Patched);

        // Build
        let build_dir = layout.build_dir();
        let deps_definitions = prepare_build_dir(tools.resolver, &deps, &build_dir)
            .map_err(at(Stage::Build))?;
        configure_and_build(
            tools.build_tool,
            &source_dir,
            &build_dir,
            &configured.definitions.clone().merged(&deps_definitions),
        )
        .map_err(at(Stage::Build))?;
        self.advance(Phase::Built);

        // Package
        let staging = layout.staging_dir();
        self.package(
            &configured,
            overrides,
            settings,
            &source_dir,
            &build_dir,
            &deps_definitions,
            &staging,
        )
        .map_err(at(Stage::Package))?;
        self.advance(Phase::Packaged);

        // Publish
        let output = PackageOutput {
            name: recipe.name().to_string(),
            version: self.version.clone(),
            package_dir: layout.package_dir(),
            libs: scan_libs(&staging).map_err(at(Stage::Publish))?,
            system_libs: system_libs(&recipe.system_libs, &configured.config),
            requires,
            options: configured.config.options,
            settings: configured.config.settings,
            definitions: configured.definitions,
        };
        publish(&output, &staging).map_err(at(Stage::Publish))?;
        self.advance(Phase::Published);

        self.observer.on_event(&LifecycleEvent::PackagePublished {
            package_id: output.package_id(),
            path: output.package_dir.clone(),
            libs: output.libs.clone(),
            system_libs: output.system_libs.clone(),
        });

        Ok(output)
    }

    /// Re-derive the configuration, check it against the one used to build,
    /// then install into the staging directory and add the license.
    #[allow(clippy::too_many_arguments)]
    fn package(
        &self,
        built_with: &Configured<'_>,
        overrides: &[(String, String)],
        settings: &Settings,
        source_dir: &Path,
        build_dir: &Path,
        deps_definitions: &Definitions,
        staging: &Path,
    ) -> Result<(), RecipeError> {
        let rederived = configure_recipe(
            self.recipe,
            self.source_data,
            &self.version,
            overrides,
            settings,
        )?;
        if rederived != *built_with {
            return Err(RecipeError::ConfigurationDrift {
                first: format!("{:?}", built_with.definitions),
                second: format!("{:?}", rederived.definitions),
            });
        }

        remove_dir_all_if_exists(staging).map_err(|e| RecipeError::Install {
            diagnostic: render(&e),
        })?;

        let install_failed = |e: anyhow::Error| RecipeError::Install {
            diagnostic: render(&e),
        };
        let handle = self
            .tools
            .build_tool
            .configure(
                source_dir,
                build_dir,
                &rederived.definitions.merged(deps_definitions),
            )
            .map_err(install_failed)?;
        self.tools
            .build_tool
            .install(&handle, staging)
            .map_err(install_failed)?;

        copy_license(&self.recipe.license_pattern, source_dir, staging)?;
        Ok(())
    }
}

fn resolve_requirements(
    resolver: &dyn DependencyResolver,
    requires: &[Requirement],
) -> Result<Vec<ResolvedDependency>, RecipeError> {
    requires
        .iter()
        .map(|requirement| {
            resolver
                .resolve(requirement)
                .map_err(|e| RecipeError::DependencyResolution {
                    requirement: requirement.to_string(),
                    diagnostic: render(&e),
                })
        })
        .collect()
}

/// Start from an empty build directory and expose the dependencies in it.
fn prepare_build_dir(
    resolver: &dyn DependencyResolver,
    deps: &[ResolvedDependency],
    build_dir: &Path,
) -> Result<Definitions, RecipeError> {
    let failed = |e: anyhow::Error| RecipeError::Build {
        diagnostic: render(&e),
    };

    remove_dir_all_if_exists(build_dir).map_err(failed)?;
    ensure_dir(build_dir).map_err(failed)?;
    resolver.expose(deps, build_dir).map_err(failed)
}

fn configure_and_build(
    build_tool: &dyn BuildTool,
    source_dir: &Path,
    build_dir: &Path,
    definitions: &Definitions,
) -> Result<(), RecipeError> {
    let failed = |e: anyhow::Error| RecipeError::Build {
        diagnostic: render(&e),
    };

    tracing::info!(
        "Building with {} ({} definitions)",
        build_tool.name(),
        definitions.len()
    );
    let handle = build_tool
        .configure(source_dir, build_dir, definitions)
        .map_err(failed)?;
    build_tool.build(&handle).map_err(failed)
}
