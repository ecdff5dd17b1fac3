//! Lifecycle events for JSON output.
//!
//! With `--message-format json` every event is written as one JSON object
//! per line. The `reason` field names the event; fields may be added but are
//! never renamed or removed.

use std::path::PathBuf;

use serde::Serialize;

use crate::ops::errors::{LifecycleError, Stage};
use crate::ops::lifecycle::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum LifecycleEvent {
    /// The lifecycle moved to a new phase.
    PhaseReached { phase: Phase, duration_ms: u64 },

    PatchApplied { patch: String },

    RewriteApplied {
        file: String,
        pattern: String,
        count: usize,
    },

    /// The package directory is in place.
    PackagePublished {
        package_id: String,
        path: PathBuf,
        libs: Vec<String>,
        system_libs: Vec<String>,
    },

    LifecycleFailed { stage: Stage, message: String },
}

impl LifecycleEvent {
    pub fn failed(err: &LifecycleError) -> Self {
        LifecycleEvent::LifecycleFailed {
            stage: err.stage,
            message: err.kind.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receives lifecycle events as they happen.
pub trait Observer {
    fn on_event(&self, event: &LifecycleEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_event(&self, _event: &LifecycleEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::errors::RecipeError;

    #[test]
    fn test_phase_serialization() {
        let event = LifecycleEvent::PhaseReached {
            phase: Phase::RequirementsResolved,
            duration_ms: 12,
        };
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"phase-reached\""));
        assert!(json.contains("\"phase\":\"requirements-resolved\""));
        assert!(json.contains("\"duration_ms\":12"));
    }

    #[test]
    fn test_failure_serialization() {
        let err = LifecycleError::new(
            Stage::Configure,
            RecipeError::UnsupportedVersion {
                version: "0.1".into(),
                available: vec![],
            },
        );
        let json = LifecycleEvent::failed(&err).to_json();
        assert!(json.contains("\"reason\":\"lifecycle-failed\""));
        assert!(json.contains("\"stage\":\"configure\""));
        assert!(json.contains("version `0.1` has no source metadata"));
    }
}
