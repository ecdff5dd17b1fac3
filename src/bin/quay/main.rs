//! quay CLI - A declarative recipe engine for native C libraries

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use quay::ops::errors::LifecycleError;
use quay::util::diagnostic;
use quay::util::shell::{ColorChoice, Shell};

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("quay=debug")
    } else {
        EnvFilter::new("quay=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = cli.color.parse::<ColorChoice>().unwrap_or_else(|e| {
        eprintln!("warning: {}", e);
        ColorChoice::Auto
    });
    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        color,
        cli.message_format == MessageFormat::Json,
    );

    if let Err(e) = run(cli.command, &shell) {
        report(&shell, &e);
        std::process::exit(1);
    }
}

fn run(command: Commands, shell: &Shell) -> Result<()> {
    match command {
        Commands::Create(args) => commands::create::execute(args, shell),
        Commands::Plan(args) => commands::plan::execute(args, shell),
        Commands::Inspect(args) => commands::inspect::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn report(shell: &Shell, e: &anyhow::Error) {
    match e.downcast_ref::<LifecycleError>() {
        Some(err) if !shell.is_json() => {
            diagnostic::emit(&err.to_diagnostic(), shell.use_color());
        }
        _ => shell.error(format!("{:#}", e)),
    }
}
