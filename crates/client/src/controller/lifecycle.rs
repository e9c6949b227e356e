//! Worker lifecycle states and the reports lifecycle events produce.

use serde::{Deserialize, Serialize};

/// Where the worker is in its lifetime.
///
/// `Parsed → Installing → Installed → Activating → Activated`; a failed
/// install ends in `Redundant`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }

    /// Only an activated worker receives fetch events.
    pub fn can_intercept_fetch(self) -> bool {
        self == WorkerState::Activated
    }

    pub fn can_install(self) -> bool {
        matches!(self, WorkerState::Parsed | WorkerState::Installed)
    }

    pub fn can_activate(self) -> bool {
        matches!(self, WorkerState::Installed | WorkerState::Activated)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a bulk pre-cache. Individual failures never fail the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecacheReport {
    /// URLs fetched OK and stored.
    pub stored: Vec<String>,
    /// URLs that errored or answered non-OK.
    pub failed: Vec<String>,
}

/// Outcome of activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateReport {
    /// Caches evicted because they belong to another version.
    pub deleted: Vec<String>,
}
