//! Command implementations

pub mod completions;
pub mod create;
pub mod inspect;
pub mod plan;

use anyhow::{bail, Context, Result};

use crate::cli::RecipeArgs;
use quay::core::recipe::Recipe;
use quay::core::settings::Settings;
use quay::recipes;
use quay::sources::metadata::SourceData;
use quay::util::config::{global_config_path, load_config, project_config_path, Config};

/// Load configuration for the current directory (global + project).
pub fn config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    load_config(
        global_config_path().as_deref(),
        &project_config_path(&cwd),
    )
}

/// The selected recipe and its source metadata.
pub fn load_recipe(args: &RecipeArgs) -> Result<(Recipe, SourceData)> {
    let (recipe, embedded) = recipes::builtin(&args.recipe)?;
    let source_data = match &args.source_data {
        Some(path) => SourceData::load(path)?,
        None => embedded,
    };
    Ok((recipe, source_data))
}

/// The version to build: `--version` or the recipe's own.
pub fn version(args: &RecipeArgs, recipe: &Recipe) -> String {
    args.package_version
        .clone()
        .unwrap_or_else(|| recipe.version().to_string())
}

/// Split `-o name=value` flags.
pub fn option_overrides(args: &RecipeArgs) -> Result<Vec<(String, String)>> {
    args.options
        .iter()
        .map(|assignment| match assignment.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => bail!("invalid option `{}`: expected `name=value`", assignment),
        })
        .collect()
}

/// Host settings, then the configured build type, then `-s key=value` flags.
pub fn settings(args: &RecipeArgs, config: &Config) -> Result<Settings> {
    let mut settings = Settings::host();

    if let Some(build_type) = &config.build.build_type {
        settings
            .set("build_type", build_type)
            .context("invalid build_type in config")?;
    }
    for assignment in &args.settings {
        settings.set_assignment(assignment)?;
    }

    Ok(settings)
}
