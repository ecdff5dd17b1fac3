//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

/// quay - A declarative recipe engine for packaging native C libraries
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: String,

    /// Output format for messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, patch, build, and package a recipe
    Create(CreateArgs),

    /// Show what `create` would do, without building anything
    Plan(PlanArgs),

    /// Show recipe metadata and its options
    Inspect(InspectArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Recipe selection and configuration shared by `create` and `plan`.
#[derive(Args, Clone)]
pub struct RecipeArgs {
    /// Recipe to use
    #[arg(long, default_value = "libzip")]
    pub recipe: String,

    /// Version to build (defaults to the recipe's version)
    #[arg(long = "version", value_name = "VERSION")]
    pub package_version: Option<String>,

    /// Option override, as name=value (repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Setting, as key=value (repeatable)
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Source metadata file to use instead of the embedded one
    #[arg(long, value_name = "PATH")]
    pub source_data: Option<PathBuf>,
}

#[derive(Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Directory of installed dependencies (<root>/<name>/<version>)
    #[arg(long, env = "QUAY_DEPS_ROOT", value_name = "DIR")]
    pub deps_root: Option<PathBuf>,

    /// Directory for sources, build trees, and packages
    #[arg(long, env = "QUAY_WORK_DIR", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// CMake generator
    #[arg(short = 'G', long)]
    pub generator: Option<String>,

    /// Number of parallel build jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Don't access the network
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Recipe to inspect
    #[arg(default_value = "libzip")]
    pub recipe: String,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
