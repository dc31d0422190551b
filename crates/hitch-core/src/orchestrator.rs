//! The orchestration context tying discovery, identity and launch together.
//!
//! Presentation layers own one [`Orchestrator`], read [`StateSnapshot`]s from
//! it, feed it [`UserIntent`]s and consume the `CoreUpdate` receiver returned
//! by the constructor.

use crate::Result;
use crate::config::{Config, Directories};
use crate::discovery::{ProcessSource, SystemProcessSource, TargetPredicate};
use crate::identity::{IdentityResolver, WindowSource, default_window_source};
use crate::launch::{
    DetachedSpawner, LaunchReport, LaunchSequencer, LaunchSettings, Spawner, run_startup_check,
};
use crate::scan::{CycleOutcome, ScanLoop, Scanner};
use crate::state::{StateSnapshot, StateStore};
use hitch_types::{CoreUpdate, ProcessId, UserIntent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The platform-facing pieces an orchestrator runs against
#[derive(Clone)]
pub struct Backends {
    pub processes: Arc<dyn ProcessSource>,
    pub windows: Arc<dyn WindowSource>,
    pub spawner: Arc<dyn Spawner>,
}

impl Backends {
    /// Real process table, window system and detached spawner.
    #[must_use]
    pub fn system() -> Self {
        Self {
            processes: Arc::new(SystemProcessSource::new()),
            windows: default_window_source(),
            spawner: Arc::new(DetachedSpawner),
        }
    }
}

pub struct Orchestrator {
    store: Arc<StateStore>,
    scan_loop: ScanLoop,
    sequencer: LaunchSequencer,
    spawner: Arc<dyn Spawner>,
    startup_check: Option<PathBuf>,
    close_on_complete: bool,
    scan_task: Option<JoinHandle<()>>,
}

impl Orchestrator {
    /// Build an orchestrator against the real system.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &Config, dirs: &Directories) -> Result<(Self, UnboundedReceiver<CoreUpdate>)> {
        Self::with_backends(config, dirs, Backends::system())
    }

    /// Build an orchestrator against the given backends.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_backends(
        config: &Config,
        dirs: &Directories,
        backends: Backends,
    ) -> Result<(Self, UnboundedReceiver<CoreUpdate>)> {
        config.validate()?;

        let (store, update_rx) = StateStore::new();
        let store = Arc::new(store);

        let scanner = Scanner::new(
            backends.processes,
            TargetPredicate::from_config(&config.target)?,
            IdentityResolver::new(backends.windows, &config.scan),
        );
        let scan_loop = ScanLoop::new(Arc::new(scanner), Arc::clone(&store), &config.scan);

        let settings = LaunchSettings::from_config(&config.launch, dirs);
        let startup_check = config.startup_check.as_ref().map(|path| {
            if path.is_relative() {
                settings.working_dir.join(path)
            } else {
                path.clone()
            }
        });
        let sequencer = LaunchSequencer::new(
            Arc::clone(&store),
            Arc::clone(&backends.spawner),
            settings,
        );

        Ok((
            Self {
                store,
                scan_loop,
                sequencer,
                spawner: backends.spawner,
                startup_check,
                close_on_complete: config.launch.close_on_complete,
                scan_task: None,
            },
            update_rx,
        ))
    }

    /// Run the startup check and start the background scan loop.
    ///
    /// Must be called from within a tokio runtime. Calling it again while the
    /// loop runs does nothing.
    pub fn start(&mut self) {
        if self.scan_task.is_some() {
            debug!("Scan loop already running");
            return;
        }

        if let Some(script) = &self.startup_check {
            run_startup_check(
                self.spawner.as_ref(),
                script,
                &self.sequencer.settings().working_dir,
            );
        }

        self.scan_task = Some(self.scan_loop.clone().spawn());
        info!("Orchestrator started");
    }

    /// Stop the scan loop. A launch in flight keeps running.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.scan_task.take() {
            task.abort();
            info!("Scan loop stopped");
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        self.store.snapshot()
    }

    /// Whether the presentation should close once a launch completes.
    #[must_use]
    pub fn close_on_complete(&self) -> bool {
        self.close_on_complete
    }

    /// Run a single scan cycle now.
    pub async fn scan_once(&self) -> CycleOutcome {
        self.scan_loop.run_cycle().await
    }

    /// Start a launch for `pid`.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyLaunching` if a launch is already in progress.
    pub fn launch(&self, pid: ProcessId) -> Result<JoinHandle<LaunchReport>> {
        self.sequencer.launch(pid)
    }

    /// Apply a presentation intent.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyLaunching` for a selection made while a launch
    /// is in progress.
    pub fn handle_intent(&mut self, intent: UserIntent) -> Result<()> {
        match intent {
            UserIntent::Select { pid } => {
                if !self.store.candidates().contains(pid) {
                    warn!(pid, "Selected PID is not in the published list");
                }
                let _task = self.launch(pid)?;
            }
            UserIntent::DragStarted => {
                if !self.store.begin_drag() {
                    debug!(mode = self.store.mode().as_str(), "Drag start ignored");
                }
            }
            UserIntent::DragEnded => {
                if !self.store.end_drag() {
                    debug!(mode = self.store.mode().as_str(), "Drag end ignored");
                }
            }
            UserIntent::Close => self.shutdown(),
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &Arc<StateStore> {
        &self.store
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
