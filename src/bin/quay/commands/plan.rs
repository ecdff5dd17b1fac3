//! `quay plan` command
//!
//! Prints everything `quay create` would do as JSON. Nothing is fetched or
//! built.

use anyhow::Result;

use crate::cli::PlanArgs;
use quay::deps::PrefixResolver;
use quay::ops::plan::plan;
use quay::util::shell::Shell;

pub fn execute(args: PlanArgs, shell: &Shell) -> Result<()> {
    let config = super::config()?;

    let (recipe, source_data) = super::load_recipe(&args.recipe)?;
    let version = super::version(&args.recipe, &recipe);
    let overrides = super::option_overrides(&args.recipe)?;
    let settings = super::settings(&args.recipe, &config)?;

    // Only the variable naming convention is used; nothing is resolved
    let resolver = PrefixResolver::new(config.paths.deps_root.unwrap_or_default());

    let plan = plan(&recipe, &source_data, &version, &overrides, &settings, &resolver)?;

    if shell.is_json() {
        shell.json_line(&serde_json::to_string(&plan)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    }

    Ok(())
}
