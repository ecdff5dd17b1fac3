//! Centralized shell output and progress management.
//!
//! The Shell provides a unified API for CLI output:
//! - Status messages with consistent formatting
//! - A spinner (via indicatif) while a long phase is running
//! - JSON output mode, one lifecycle event per line on stdout
//!
//! Human output goes to stderr, so stdout carries only results and JSON.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::ops::events::{LifecycleEvent, Observer};
use crate::ops::lifecycle::Phase;

/// Shell output mode - Human and Json are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (Human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no progress
    Quiet,
    #[default]
    Normal,
    /// --verbose: status lines only, no spinner
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status verbs for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success (green)
    Configured,
    Resolved,
    Fetched,
    Patched,
    Built,
    Packaged,
    Published,
    Finished,

    // In progress (cyan)
    Resolving,
    Fetching,
    Patching,
    Building,
    Packaging,
    Publishing,

    Info,
    Warning,
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Configured => "Configured",
            Status::Resolved => "Resolved",
            Status::Fetched => "Fetched",
            Status::Patched => "Patched",
            Status::Built => "Built",
            Status::Packaged => "Packaged",
            Status::Published => "Published",
            Status::Finished => "Finished",
            Status::Resolving => "Resolving",
            Status::Fetching => "Fetching",
            Status::Patching => "Patching",
            Status::Building => "Building",
            Status::Packaging => "Packaging",
            Status::Publishing => "Publishing",
            Status::Info => "Info",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Configured
            | Status::Resolved
            | Status::Fetched
            | Status::Patched
            | Status::Built
            | Status::Packaged
            | Status::Published
            | Status::Finished => "\x1b[1;32m",
            Status::Resolving
            | Status::Fetching
            | Status::Patching
            | Status::Building
            | Status::Packaging
            | Status::Publishing => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }

    /// Status for a completed phase and the status of the work that follows it.
    fn for_phase(phase: Phase) -> Option<(Status, Option<Status>)> {
        match phase {
            Phase::Configured => Some((Status::Configured, Some(Status::Resolving))),
            Phase::RequirementsResolved => Some((Status::Resolved, Some(Status::Fetching))),
            Phase::Sourced => Some((Status::Fetched, Some(Status::Patching))),
            Phase::Patched => Some((Status::Patched, Some(Status::Building))),
            Phase::Built => Some((Status::Built, Some(Status::Packaging))),
            Phase::Packaged => Some((Status::Packaged, Some(Status::Publishing))),
            Phase::Published => Some((Status::Published, None)),
            Phase::Created | Phase::Failed(_) => None,
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
    use_spinner: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl Shell {
    pub fn new(mode: ShellMode) -> Self {
        let stderr_tty = io::stderr().is_terminal();
        let (use_color, use_spinner) = match &mode {
            ShellMode::Json => (false, false),
            ShellMode::Human { verbosity, color } => (
                match color {
                    ColorChoice::Auto => stderr_tty,
                    ColorChoice::Always => true,
                    ColorChoice::Never => false,
                },
                *verbosity == Verbosity::Normal && stderr_tty,
            ),
        };

        Shell {
            mode,
            use_color,
            use_spinner,
            spinner: Mutex::new(None),
        }
    }

    /// Create a shell from CLI flags. JSON mode takes precedence over
    /// quiet/verbose.
    pub fn from_flags(
        quiet: bool,
        verbose: bool,
        color: ColorChoice,
        message_format_json: bool,
    ) -> Self {
        let mode = if message_format_json {
            ShellMode::Json
        } else {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human { verbosity, color }
        };

        Shell::new(mode)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message as `{status:>12} {message}`.
    ///
    /// In quiet mode only errors are printed; in JSON mode nothing is.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() || (self.is_quiet() && status != Status::Error) {
            return;
        }

        let line = format!("{} {}", self.format_status(status), msg);
        match self.spinner.lock().ok().and_then(|s| s.clone()) {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print an error. In JSON mode this is an `error` event on stdout.
    pub fn error(&self, msg: impl Display) {
        self.stop_spinner();
        if self.is_json() {
            let event = serde_json::json!({
                "reason": "error",
                "message": msg.to_string(),
            });
            self.json_line(&event.to_string());
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// Write one line of JSON to stdout. Ignored in human mode.
    pub fn json_line(&self, line: &str) {
        if !self.is_json() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }

    fn start_spinner(&self, status: Status) {
        if !self.use_spinner {
            return;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{}...", status.as_str()));
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(old) = slot.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

impl Observer for Shell {
    fn on_event(&self, event: &LifecycleEvent) {
        if self.is_json() {
            self.json_line(&event.to_json());
            return;
        }

        match event {
            LifecycleEvent::PhaseReached { phase, duration_ms } => {
                self.stop_spinner();
                if let Some((done, next)) = Status::for_phase(*phase) {
                    self.status(done, format!("in {}", format_duration(*duration_ms)));
                    if let Some(next) = next {
                        self.start_spinner(next);
                    }
                }
            }
            LifecycleEvent::PatchApplied { patch } => self.status(Status::Patched, patch),
            LifecycleEvent::RewriteApplied {
                file,
                pattern,
                count,
            } => {
                tracing::debug!("rewrote `{}` in {} ({}x)", pattern, file, count);
            }
            LifecycleEvent::PackagePublished {
                package_id, path, ..
            } => {
                self.status(
                    Status::Finished,
                    format!("{} ({})", package_id, path.display()),
                );
            }
            LifecycleEvent::LifecycleFailed { stage, .. } => {
                self.stop_spinner();
                tracing::debug!("{} phase failed", stage);
            }
        }
    }
}

fn format_duration(ms: u64) -> String {
    let secs = ms as f64 / 1000.0;
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        let shell = Shell::from_flags(true, false, ColorChoice::Never, false);
        assert!(shell.is_quiet());

        // JSON takes precedence
        let shell = Shell::from_flags(true, true, ColorChoice::Auto, true);
        assert!(shell.is_json());
        assert!(!shell.is_quiet());
    }

    #[test]
    fn test_color_choice_parse() {
        assert_eq!("always".parse::<ColorChoice>().unwrap(), ColorChoice::Always);
        assert!("sometimes".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        });

        let formatted = shell.format_status(Status::Published);
        assert_eq!(formatted.trim(), "Published");
        assert_eq!(formatted.len(), STATUS_WIDTH);
    }

    #[test]
    fn test_every_progress_phase_has_a_status() {
        for phase in [
            Phase::Configured,
            Phase::RequirementsResolved,
            Phase::Sourced,
            Phase::Patched,
            Phase::Built,
            Phase::Packaged,
        ] {
            let (_, next) = Status::for_phase(phase).unwrap();
            assert!(next.is_some(), "{:?} has no follow-up status", phase);
        }
        assert_eq!(
            Status::for_phase(Phase::Published),
            Some((Status::Published, None))
        );
        assert_eq!(Status::for_phase(Phase::Created), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(500), "0.50s");
        assert_eq!(format_duration(90_000), "1.5m");
    }
}
