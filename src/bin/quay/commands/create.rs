//! `quay create` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::CreateArgs;
use quay::builder::CMakeTool;
use quay::deps::PrefixResolver;
use quay::ops::lifecycle::{Collaborators, RecipeRunner};
use quay::patch::GitApply;
use quay::sources::TarballFetcher;
use quay::util::config::default_cache_dir;
use quay::util::shell::Shell;

pub fn execute(args: CreateArgs, shell: &Shell) -> Result<()> {
    let config = super::config()?;

    let (recipe, source_data) = super::load_recipe(&args.recipe)?;
    let version = super::version(&args.recipe, &recipe);
    let overrides = super::option_overrides(&args.recipe)?;
    let settings = super::settings(&args.recipe, &config)?;

    // CLI > config > per-user cache
    let cache_dir = default_cache_dir().unwrap_or_else(|| PathBuf::from(".quay"));
    let work_dir = args
        .work_dir
        .or(config.paths.work_dir)
        .unwrap_or_else(|| cache_dir.join("work"));
    let deps_root = args
        .deps_root
        .or(config.paths.deps_root)
        .unwrap_or_else(|| cache_dir.join("deps"));

    let fetcher = TarballFetcher::new().offline(args.offline || config.net.offline);
    let patcher = GitApply::new();
    let resolver = PrefixResolver::new(&deps_root);
    let build_tool = CMakeTool::new()?
        .generator(args.generator.or(config.build.generator))
        .jobs(args.jobs.or(config.build.jobs));

    tracing::debug!(
        "work dir {}, deps root {}",
        work_dir.display(),
        deps_root.display()
    );

    let tools = Collaborators {
        fetcher: &fetcher,
        patcher: &patcher,
        resolver: &resolver,
        build_tool: &build_tool,
    };
    let output = RecipeRunner::new(&recipe, &source_data, tools)
        .version(version)
        .work_dir(work_dir)
        .observer(shell)
        .run(&overrides, settings)?;

    if !shell.is_json() {
        println!("{}", output.package_dir.display());
        println!("libs: {}", output.link_libs().join(" "));
    }

    Ok(())
}
