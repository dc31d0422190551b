//! The background scan loop.
//!
//! Each cycle takes a process snapshot, evicts titles of processes that went
//! away, resolves titles for the rest and offers the result to the store,
//! which publishes only when the set of process ids changed.

use crate::config::ScanConfig;
use crate::discovery::{ProcessSource, TargetPredicate, snapshot};
use crate::identity::{IdentityResolver, TitleCache};
use crate::state::StateStore;
use crate::{Error, Result};
use hitch_types::{Candidate, CandidateSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Runs one discovery pass. Blocking: call from a blocking-capable thread.
pub struct Scanner {
    processes: Arc<dyn ProcessSource>,
    predicate: TargetPredicate,
    resolver: IdentityResolver,
}

impl Scanner {
    pub fn new(
        processes: Arc<dyn ProcessSource>,
        predicate: TargetPredicate,
        resolver: IdentityResolver,
    ) -> Self {
        Self {
            processes,
            predicate,
            resolver,
        }
    }

    /// Snapshot, evict, resolve.
    ///
    /// # Errors
    ///
    /// Returns an error if process enumeration fails as a whole.
    pub fn scan(&self, titles: &Mutex<TitleCache>) -> Result<CandidateSet> {
        let pids = snapshot(self.processes.as_ref(), &self.predicate)?;

        let evicted = titles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain_only(&pids);
        if !evicted.is_empty() {
            debug!(?evicted, "Evicted titles of exited processes");
        }

        Ok(pids
            .iter()
            .map(|&pid| {
                let resolved = self.resolver.resolve(pid, titles);
                Candidate::new(pid, &resolved.title, resolved.origin)
            })
            .collect())
    }
}

/// What a single guarded cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Mode was Dragging or Launching (or another cycle was running)
    Skipped,
    /// Scan ran; process ids matched the published set
    Unchanged,
    /// Scan ran and a new set was published
    Published,
    /// Scan failed; logged, loop continues
    Failed,
}

/// Leaves `Scanning` when a cycle ends, including when its task is aborted
struct ScanGuard<'a>(&'a StateStore);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.end_scan();
    }
}

/// Long-lived driver around a [`Scanner`]
#[derive(Clone)]
pub struct ScanLoop {
    scanner: Arc<Scanner>,
    store: Arc<StateStore>,
    idle_interval: Duration,
    active_interval: Duration,
}

impl ScanLoop {
    pub fn new(scanner: Arc<Scanner>, store: Arc<StateStore>, config: &ScanConfig) -> Self {
        Self {
            scanner,
            store,
            idle_interval: config.idle_interval(),
            active_interval: config.active_interval(),
        }
    }

    /// Run one cycle unless the current mode forbids it.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if !self.store.begin_scan() {
            debug!(mode = self.store.mode().as_str(), "Scan cycle skipped");
            return CycleOutcome::Skipped;
        }

        let _scanning = ScanGuard(&self.store);

        let scanner = Arc::clone(&self.scanner);
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || scanner.scan(store.titles()))
            .await
            .map_err(|e| Error::Task(e.to_string()))
            .and_then(|r| r);

        match result {
            Ok(candidates) => {
                if self.store.publish(candidates) {
                    CycleOutcome::Published
                } else {
                    CycleOutcome::Unchanged
                }
            }
            Err(e) => {
                error!("Scan cycle failed: {}", e);
                CycleOutcome::Failed
            }
        }
    }

    /// Sleep chosen from the published set: short while empty, longer once
    /// something is listed.
    #[must_use]
    pub fn next_interval(&self) -> Duration {
        if self.store.candidates().is_empty() {
            self.idle_interval
        } else {
            self.active_interval
        }
    }

    /// Loop forever. A rescan request cuts the current sleep short.
    pub async fn run(self) {
        info!(
            idle_ms = self.idle_interval.as_millis(),
            active_ms = self.active_interval.as_millis(),
            "Scan loop started"
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                () = tokio::time::sleep(self.next_interval()) => {}
                () = self.store.rescan_requested() => {
                    debug!("Out-of-band rescan requested");
                }
            }
        }
    }

    /// Start the loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
