//! Starting scripts as detached processes.

use super::ScriptKind;
use crate::{Error, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Starts a script without waiting on it
pub trait Spawner: Send + Sync {
    /// Start `script` in `working_dir` and return as soon as the process exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::Spawn` if the process could not be created.
    fn spawn_detached(&self, script: &Path, kind: ScriptKind, working_dir: &Path) -> Result<()>;
}

/// Spawns through the platform shell with no console and no inherited stdio.
///
/// The child is never waited on. On Unix an exited `sh` therefore stays a
/// zombie until hitch itself exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedSpawner;

impl Spawner for DetachedSpawner {
    // Never waited on; the launcher outlives us.
    #[allow(clippy::zombie_processes)]
    fn spawn_detached(&self, script: &Path, kind: ScriptKind, working_dir: &Path) -> Result<()> {
        let mut command = match kind {
            ScriptKind::Batch => {
                let mut command = Command::new("cmd");
                command.arg("/C").arg(script);
                command
            }
            ScriptKind::Shell => {
                let mut command = Command::new("sh");
                command.arg(script);
                command
            }
        };

        command
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut command);

        let child = command
            .spawn()
            .map_err(|e| Error::Spawn(format!("Failed to start {}: {e}", script.display())))?;

        debug!(child = child.id(), script = %script.display(), "Started detached process");
        Ok(())
    }
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    // Own process group: terminal signals aimed at us do not reach it.
    command.process_group(0);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}
