//! Launch sequencing.
//!
//! A launch claims the single launch slot synchronously, then drives a fixed
//! progress schedule on a task. Part way through, the launcher script for the
//! chosen PID is started detached. The slot is always released when the task
//! ends, whether it completes, fails or is dropped.

mod progress;
mod script;
mod spawn;

pub use progress::{ProgressDriver, ProgressPlan};
pub use script::{SCRIPT_NAME_LEN, ScriptArtifact, ScriptKind, random_name};
pub use spawn::{DetachedSpawner, Spawner};

use crate::Result;
use crate::config::{Directories, LaunchConfig};
use crate::state::StateStore;
use hitch_types::{CoreUpdate, ProcessId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything needed to run a launch, resolved against the directories
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub script_dir: PathBuf,
    pub kind: ScriptKind,
    pub plan: ProgressPlan,
}

impl LaunchSettings {
    #[must_use]
    pub fn from_config(config: &LaunchConfig, dirs: &Directories) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: config.resolved_working_dir(dirs),
            script_dir: config.resolved_script_dir(dirs),
            kind: ScriptKind::native(),
            plan: ProgressPlan::from_config(config),
        }
    }
}

/// What a finished launch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub pid: ProcessId,
    /// Script written for this launch, if writing succeeded
    pub script: Option<PathBuf>,
    /// Step at which the spawn was attempted
    pub spawn_step: Option<u32>,
    /// Whether the launcher process was actually created
    pub spawned: bool,
}

/// Releases the launch slot on drop
struct LaunchGuard {
    store: Arc<StateStore>,
    pid: ProcessId,
}

impl Drop for LaunchGuard {
    fn drop(&mut self) {
        self.store.finish_launch(self.pid);
    }
}

#[derive(Clone)]
pub struct LaunchSequencer {
    store: Arc<StateStore>,
    spawner: Arc<dyn Spawner>,
    settings: Arc<LaunchSettings>,
}

impl LaunchSequencer {
    pub fn new(store: Arc<StateStore>, spawner: Arc<dyn Spawner>, settings: LaunchSettings) -> Self {
        Self {
            store,
            spawner,
            settings: Arc::new(settings),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    /// Claim the launch slot for `pid` and run the sequence on a new task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyLaunching` if another launch holds the slot. In
    /// that case nothing is written and nothing is spawned.
    pub fn launch(&self, pid: ProcessId) -> Result<JoinHandle<LaunchReport>> {
        self.store.begin_launch(pid)?;
        info!(pid, "Launch started");

        let guard = LaunchGuard {
            store: Arc::clone(&self.store),
            pid,
        };
        let sequencer = self.clone();

        Ok(tokio::spawn(async move {
            let report = sequencer.drive(pid).await;
            drop(guard);
            report
        }))
    }

    async fn drive(&self, pid: ProcessId) -> LaunchReport {
        let settings = &self.settings;
        let plan = settings.plan;

        let artifact = match ScriptArtifact::create(
            &settings.script_dir,
            settings.kind,
            &settings.program,
            &settings.args,
            pid,
        ) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(pid, "Launcher will not start: {}", e);
                None
            }
        };

        let mut report = LaunchReport {
            pid,
            script: artifact.as_ref().map(|a| a.path().to_path_buf()),
            spawn_step: None,
            spawned: false,
        };

        let mut driver = ProgressDriver::new(plan);
        let start = Instant::now();

        for step in 0..=plan.total_steps {
            // Deadlines are measured from the start so timer rounding does not accumulate
            tokio::time::sleep_until(start + plan.offset_of(step)).await;
            self.store.set_progress(pid, plan.progress_at(step));

            if driver.check_spawn(step) {
                report.spawn_step = Some(step);
                report.spawned = self.spawn_launcher(artifact.as_ref(), pid);
            }
        }

        self.store.notify(CoreUpdate::LaunchCompleted { pid });
        info!(pid, spawned = report.spawned, "Launch sequence complete");
        report
    }

    fn spawn_launcher(&self, artifact: Option<&ScriptArtifact>, pid: ProcessId) -> bool {
        let Some(artifact) = artifact else {
            self.store.notify(CoreUpdate::LaunchSpawned {
                pid,
                script: None,
                ok: false,
            });
            return false;
        };

        let ok = match self.spawner.spawn_detached(
            artifact.path(),
            artifact.kind(),
            &self.settings.working_dir,
        ) {
            Ok(()) => {
                info!(pid, script = %artifact.path().display(), "Launcher started");
                true
            }
            Err(e) => {
                error!(pid, "Failed to start launcher: {}", e);
                false
            }
        };

        self.store.notify(CoreUpdate::LaunchSpawned {
            pid,
            script: Some(artifact.path().to_path_buf()),
            ok,
        });
        ok
    }
}

/// Start the preflight script at `script`, if there is one.
///
/// Returns whether a process was started. A missing file is not an error.
pub fn run_startup_check(spawner: &dyn Spawner, script: &Path, working_dir: &Path) -> bool {
    if !script.is_file() {
        debug!(path = %script.display(), "No startup check script");
        return false;
    }

    match spawner.spawn_detached(script, kind_for_path(script), working_dir) {
        Ok(()) => {
            info!(path = %script.display(), "Startup check started");
            true
        }
        Err(e) => {
            warn!(path = %script.display(), "Startup check failed: {}", e);
            false
        }
    }
}

fn kind_for_path(path: &Path) -> ScriptKind {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("bat") || ext.eq_ignore_ascii_case("cmd") => {
            ScriptKind::Batch
        }
        Some(ext) if ext.eq_ignore_ascii_case("sh") => ScriptKind::Shell,
        _ => ScriptKind::native(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_path() {
        assert_eq!(kind_for_path(Path::new("check.BAT")), ScriptKind::Batch);
        assert_eq!(kind_for_path(Path::new("check.cmd")), ScriptKind::Batch);
        assert_eq!(kind_for_path(Path::new("check.sh")), ScriptKind::Shell);
        assert_eq!(kind_for_path(Path::new("check")), ScriptKind::native());
    }

    #[test]
    fn test_settings_resolve_against_directories() {
        let dirs = Directories::with_base(Path::new("/tmp/hitch-test"));
        let settings = LaunchSettings::from_config(&LaunchConfig::default(), &dirs);
        assert_eq!(settings.working_dir, dirs.launcher);
        assert_eq!(settings.script_dir, dirs.launcher);
        assert_eq!(settings.program, "java");
        assert_eq!(settings.plan.total_steps, 1000);
    }
}
