//! Shared orchestration state.
//!
//! The store is the single writer-side authority for the mode flags, the
//! published candidate set and the title cache. Every transition happens under
//! one lock and emits its `CoreUpdate` while that lock is held, so the order of
//! updates a presentation layer receives always matches the order of state
//! changes.

use crate::diff::has_changed;
use crate::identity::TitleCache;
use crate::{Error, Result};
use hitch_types::{CandidateSet, CoreUpdate, Mode, OrchestratorState, ProcessId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Read-only view handed to presentation layers
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub state: OrchestratorState,
    pub candidates: Arc<CandidateSet>,
}

#[derive(Debug, Default)]
struct Published {
    state: OrchestratorState,
    candidates: Arc<CandidateSet>,
}

pub struct StateStore {
    inner: Mutex<Published>,
    titles: Mutex<TitleCache>,
    update_tx: UnboundedSender<CoreUpdate>,
    rescan: Notify,
}

impl StateStore {
    /// Create a store and the receiver for its updates.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<CoreUpdate>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                inner: Mutex::new(Published::default()),
                titles: Mutex::new(TitleCache::new()),
                update_tx,
                rescan: Notify::new(),
            },
            update_rx,
        )
    }

    fn lock(&self) -> MutexGuard<'_, Published> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, update: CoreUpdate) {
        if self.update_tx.send(update).is_err() {
            debug!("Update receiver dropped; discarding update");
        }
    }

    fn set_mode(&self, published: &mut Published, mode: Mode, target: Option<ProcessId>) {
        let from = published.state.mode;
        published.state.mode = mode;
        published.state.active_launch_target = target;
        debug!(from = from.as_str(), to = mode.as_str(), "Mode transition");
        self.emit(CoreUpdate::ModeChanged { mode, target });
    }

    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let published = self.lock();
        StateSnapshot {
            state: published.state,
            candidates: Arc::clone(&published.candidates),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.lock().state.mode
    }

    #[must_use]
    pub fn candidates(&self) -> Arc<CandidateSet> {
        Arc::clone(&self.lock().candidates)
    }

    /// The title cache shared with the resolver.
    #[must_use]
    pub fn titles(&self) -> &Mutex<TitleCache> {
        &self.titles
    }

    /// Copy of the title cache for readers that must not hold the lock.
    #[must_use]
    pub fn title_snapshot(&self) -> TitleCache {
        self.titles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Enter `Scanning` if nothing else is going on. Returns false when the
    /// cycle must be skipped.
    pub fn begin_scan(&self) -> bool {
        let mut published = self.lock();
        let mode = published.state.mode;
        if mode.suppresses_scan() || mode == Mode::Scanning {
            return false;
        }
        self.set_mode(&mut published, Mode::Scanning, None);
        true
    }

    /// Leave `Scanning` unless another mode took over during the cycle.
    pub fn end_scan(&self) {
        let mut published = self.lock();
        if published.state.mode == Mode::Scanning {
            self.set_mode(&mut published, Mode::Idle, None);
        }
    }

    /// Replace the published candidates when their process ids changed.
    ///
    /// Returns true when a `CandidatesChanged` update was emitted. Nothing is
    /// published while dragging or launching; a cycle that straddles a drag
    /// is dropped and the rescan on drag end publishes instead.
    pub fn publish(&self, candidates: CandidateSet) -> bool {
        let mut published = self.lock();

        if published.state.mode.suppresses_scan() {
            debug!(mode = published.state.mode.as_str(), "Candidate list frozen");
            return false;
        }
        if !has_changed(&published.candidates, &candidates) {
            return false;
        }

        info!(count = candidates.len(), "Publishing candidate set");
        let candidates = Arc::new(candidates);
        published.candidates = Arc::clone(&candidates);
        self.emit(CoreUpdate::CandidatesChanged {
            candidates: (*candidates).clone(),
        });
        true
    }

    /// Enter `Dragging`. Refused while a launch is active.
    pub fn begin_drag(&self) -> bool {
        let mut published = self.lock();
        match published.state.mode {
            Mode::Idle | Mode::Scanning => {
                self.set_mode(&mut published, Mode::Dragging, None);
                true
            }
            Mode::Dragging | Mode::Launching => false,
        }
    }

    /// Leave `Dragging` and ask the scan loop for an immediate cycle.
    pub fn end_drag(&self) -> bool {
        {
            let mut published = self.lock();
            if published.state.mode != Mode::Dragging {
                return false;
            }
            self.set_mode(&mut published, Mode::Idle, None);
        }
        self.request_rescan();
        true
    }

    /// Enter `Launching` for `pid`.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyLaunching` (carrying the active target) if a
    /// launch is already in progress.
    pub fn begin_launch(&self, pid: ProcessId) -> Result<()> {
        let mut published = self.lock();
        if published.state.mode == Mode::Launching {
            return Err(Error::AlreadyLaunching {
                pid: published.state.active_launch_target.unwrap_or(pid),
            });
        }
        published.state.progress = 0.0;
        self.set_mode(&mut published, Mode::Launching, Some(pid));
        Ok(())
    }

    /// Record launch progress. Ignored unless launching `pid`.
    pub fn set_progress(&self, pid: ProcessId, progress: f32) {
        let mut published = self.lock();
        if published.state.mode != Mode::Launching
            || published.state.active_launch_target != Some(pid)
        {
            return;
        }
        let progress = progress.clamp(0.0, 1.0);
        published.state.progress = progress;
        self.emit(CoreUpdate::LaunchProgress { pid, progress });
    }

    /// Leave `Launching`. Safe to call more than once.
    pub fn finish_launch(&self, pid: ProcessId) {
        let mut published = self.lock();
        if published.state.mode != Mode::Launching
            || published.state.active_launch_target != Some(pid)
        {
            return;
        }
        self.set_mode(&mut published, Mode::Idle, None);
    }

    /// Forward a sequencer update that carries no state change of its own.
    pub fn notify(&self, update: CoreUpdate) {
        let _published = self.lock();
        self.emit(update);
    }

    /// Wake the scan loop for an out-of-band cycle.
    pub fn request_rescan(&self) {
        self.rescan.notify_one();
    }

    /// Resolves once a rescan has been requested.
    pub async fn rescan_requested(&self) {
        self.rescan.notified().await;
    }
}
