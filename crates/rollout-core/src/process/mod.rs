//! Blocking-process descriptors, snapshots, and the observer seam.

pub mod observer;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use observer::SystemObserver;

/// Who owns a matched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessOwner {
    /// Running in an interactive user session.
    #[default]
    Interactive,
    /// Running as a service / daemon.
    Service,
}

/// One application to watch for during a deployment.
///
/// Immutable once loaded from configuration; read-only input to the observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    /// Process name or executable-path suffix to match (case-insensitive).
    pub pattern: String,

    /// Friendly name shown in prompts. Falls back to the pattern.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Whether the process must be closed before the action may run.
    #[serde(default = "default_close_required")]
    pub close_required: bool,

    #[serde(default)]
    pub owner: ProcessOwner,
}

fn default_close_required() -> bool {
    true
}

/// Case-insensitive name comparison tolerating an `.exe`-style extension on
/// either side ("notepad" matches "notepad.exe" and vice versa).
fn name_matches(name: &str, pattern: &str) -> bool {
    let name = name.to_ascii_lowercase();
    if name == pattern {
        return true;
    }
    name.split('.').next() == pattern.split('.').next()
}

impl ProcessDescriptor {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            display_name: None,
            close_required: true,
            owner: ProcessOwner::Interactive,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_close_required(mut self, close_required: bool) -> Self {
        self.close_required = close_required;
        self
    }

    /// Name to show the user.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.pattern)
    }

    /// Whether a running process matches this descriptor.
    ///
    /// Patterns containing a path separator are matched as a suffix of the
    /// executable path when one is known, and by their file-name component
    /// otherwise; plain patterns are matched against the process name, with
    /// or without an `.exe`-style extension. All comparisons are
    /// case-insensitive.
    pub fn matches(&self, name: &str, exe: Option<&Path>) -> bool {
        let pattern = self.pattern.to_ascii_lowercase();

        if pattern.contains('/') || pattern.contains('\\') {
            if let Some(exe) = exe {
                return exe.to_string_lossy().to_ascii_lowercase().ends_with(&pattern);
            }
            let file = pattern.rsplit(['/', '\\']).next().unwrap_or(&pattern);
            return name_matches(name, file);
        }

        name_matches(name, &pattern)
    }
}

/// A process observed running at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningProcess {
    pub pid: u32,
    pub name: String,
    /// Main window title, when the observer can supply one.
    pub title: Option<String>,
}

/// Point-in-time result of one observation.
///
/// Never mutated, only replaced by the next poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub taken_at: DateTime<Utc>,
    pub processes: Vec<RunningProcess>,
}

impl ProcessSnapshot {
    pub fn new(processes: Vec<RunningProcess>) -> Self {
        Self {
            taken_at: Utc::now(),
            processes,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn pids(&self) -> Vec<u32> {
        self.processes.iter().map(|p| p.pid).collect()
    }
}

/// Read-only view of the OS process table.
///
/// Queried once per call; callers poll explicitly. A process that exits
/// between the snapshot and the caller's use is simply absent next call.
pub trait ProcessObserver {
    fn observe(&mut self, descriptors: &[ProcessDescriptor]) -> ProcessSnapshot;
}

/// Subset of a snapshot that still blocks the deployment.
pub fn blocking_processes<'a>(
    descriptors: &[ProcessDescriptor],
    snapshot: &'a ProcessSnapshot,
) -> Vec<&'a RunningProcess> {
    snapshot
        .processes
        .iter()
        .filter(|running| {
            descriptors
                .iter()
                .any(|d| d.close_required && d.matches(&running.name, None))
        })
        .collect()
}
