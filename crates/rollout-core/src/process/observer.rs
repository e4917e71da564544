//! sysinfo-backed process table observer.

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use super::{ProcessDescriptor, ProcessObserver, ProcessSnapshot, RunningProcess};

/// Observer backed by the OS process table.
///
/// Each `observe` call refreshes the table; nothing is cached between calls.
/// Transient enumeration failures degrade to an empty snapshot rather than
/// an error, so callers just see the process as absent on the next poll.
pub struct SystemObserver {
    system: System,
}

impl SystemObserver {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessObserver for SystemObserver {
    fn observe(&mut self, descriptors: &[ProcessDescriptor]) -> ProcessSnapshot {
        let refresh = ProcessRefreshKind::nothing().with_exe(UpdateKind::Always);
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, refresh);

        if self.system.processes().is_empty() {
            tracing::debug!("process table enumeration returned no entries");
            return ProcessSnapshot::empty();
        }

        let mut matched = Vec::new();
        for (pid, process) in self.system.processes() {
            let name = process.name().to_string_lossy();
            if descriptors.iter().any(|d| d.matches(&name, process.exe())) {
                matched.push(RunningProcess {
                    pid: pid.as_u32(),
                    name: name.into_owned(),
                    // sysinfo exposes no window titles; richer observers may.
                    title: None,
                });
            }
        }
        matched.sort_by_key(|p| p.pid);

        ProcessSnapshot::new(matched)
    }
}
