//! Identity resolution: turn a process id into a title a person recognises.
//!
//! Titles come from the visible top-level windows a process owns. Probing the
//! window system is comparatively expensive, so every answer (including the
//! sentinel for "nothing found in time") is cached for the life of the id.

mod cache;
#[cfg(target_os = "linux")]
mod compositor;
#[cfg(windows)]
mod win32;

pub use cache::TitleCache;
#[cfg(target_os = "linux")]
pub use compositor::CompositorWindows;
#[cfg(windows)]
pub use win32::Win32Windows;

use crate::Result;
use crate::config::ScanConfig;
use hitch_types::{CacheOrigin, ProcessId};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// A top-level window as reported by the window system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub owner_pid: ProcessId,
    pub visible: bool,
    pub title: String,
}

/// Anything that can list top-level windows
pub trait WindowSource: Send + Sync {
    /// Enumerate top-level windows.
    ///
    /// # Errors
    ///
    /// Returns an error if the window system cannot be queried at all.
    fn windows(&self) -> Result<Vec<WindowInfo>>;
}

/// Window source for platforms without a supported window system
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWindows;

impl WindowSource for NoWindows {
    fn windows(&self) -> Result<Vec<WindowInfo>> {
        Ok(Vec::new())
    }
}

/// First visible, non-blank title owned by `pid`, or `None` once `deadline`
/// passes or the list is exhausted.
#[must_use]
pub fn first_visible_title<'a>(
    windows: impl IntoIterator<Item = &'a WindowInfo>,
    pid: ProcessId,
    deadline: Instant,
) -> Option<String> {
    for window in windows {
        if Instant::now() >= deadline {
            return None;
        }
        if window.owner_pid == pid && window.visible && !window.title.trim().is_empty() {
            return Some(window.title.clone());
        }
    }
    None
}

/// Outcome of a single resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub title: String,
    pub origin: CacheOrigin,
}

/// Resolves titles against a window source within a fixed budget
pub struct IdentityResolver {
    source: Arc<dyn WindowSource>,
    deadline: Duration,
    poll: Duration,
    sentinel: String,
}

impl IdentityResolver {
    pub fn new(source: Arc<dyn WindowSource>, config: &ScanConfig) -> Self {
        Self {
            source,
            deadline: config.resolve_deadline(),
            poll: config.resolve_poll(),
            sentinel: config.sentinel_title.clone(),
        }
    }

    /// Return the cached title for `pid`, probing the window system on a miss.
    ///
    /// The cache lock is not held during the probe, so readers are never
    /// blocked for the length of the budget. If another writer resolved the
    /// same id meanwhile, its title wins.
    ///
    /// Blocks the calling thread for at most the configured deadline.
    pub fn resolve(&self, pid: ProcessId, cache: &Mutex<TitleCache>) -> Resolved {
        {
            let cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(title) = cache.get(pid) {
                trace!(pid, "Title cache hit");
                return Resolved {
                    title: title.to_string(),
                    origin: CacheOrigin::Cached,
                };
            }
        }

        let probed = self.probe(pid);

        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        let title = cache.insert_if_absent(pid, probed).to_string();
        Resolved {
            title,
            origin: CacheOrigin::Fresh,
        }
    }

    /// Poll the window source until a qualifying window shows up or the
    /// deadline passes. Falls back to the sentinel.
    fn probe(&self, pid: ProcessId) -> String {
        let deadline = Instant::now() + self.deadline;

        loop {
            match self.source.windows() {
                Ok(windows) => {
                    if let Some(title) = first_visible_title(&windows, pid, deadline) {
                        debug!(pid, title = %title, "Resolved window title");
                        return title;
                    }
                }
                Err(e) => {
                    debug!(pid, "Window query failed, using sentinel: {}", e);
                    break;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(self.poll.min(deadline - now));
        }

        debug!(pid, "No titled window within budget");
        self.sentinel.clone()
    }
}

/// Pick the window source for the platform we are running on.
#[must_use]
pub fn default_window_source() -> Arc<dyn WindowSource> {
    #[cfg(windows)]
    {
        Arc::new(Win32Windows)
    }

    #[cfg(target_os = "linux")]
    {
        Arc::new(CompositorWindows::detect())
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Arc::new(NoWindows)
    }
}
