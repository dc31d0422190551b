use super::{ProcessEntry, ProcessSource};
use crate::{Error, Result};
use std::sync::Mutex;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// Process table backed by `sysinfo`.
///
/// A single `System` is kept for the life of the source so repeated scans only
/// refresh what changed instead of rebuilding the table.
pub struct SystemProcessSource {
    system: Mutex<System>,
}

impl SystemProcessSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SystemProcessSource {
    fn processes(&self) -> Result<Vec<ProcessEntry>> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| Error::Enumeration("process table lock poisoned".to_string()))?;

        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
        );

        let entries = system
            .processes()
            .iter()
            // Linux reports threads as tasks sharing the parent's command line
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, process)| {
                let cmd = process
                    .cmd()
                    .iter()
                    .map(|s| s.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" ");

                ProcessEntry {
                    pid: pid.as_u32(),
                    name: process.name().to_string_lossy().to_string(),
                    cmdline: (!cmd.is_empty()).then_some(cmd),
                }
            })
            .collect();

        Ok(entries)
    }
}
