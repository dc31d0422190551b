//! Shared types for hitch components.
//!
//! This crate provides the types exchanged between hitch-core and its
//! presentation layers. All types are serializable so the headless CLI can
//! print them as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// OS-assigned process identifier, unique only while the process lives.
pub type ProcessId = u32;

/// Render a resolved title the way candidates are shown to the user.
#[must_use]
pub fn format_display_title(title: &str, pid: ProcessId) -> String {
    format!("{title} (PID: {pid})")
}

/// Where a candidate's title came from during the cycle that produced it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOrigin {
    /// Resolved by probing the window system this cycle
    #[default]
    Fresh,
    /// Served from the title cache without an OS call
    Cached,
}

/// A running process eligible for selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub process_id: ProcessId,
    pub display_title: String,
    pub cache_origin: CacheOrigin,
}

impl Candidate {
    /// Build a candidate from a raw title, applying the display format.
    #[must_use]
    pub fn new(process_id: ProcessId, title: &str, cache_origin: CacheOrigin) -> Self {
        Self {
            process_id,
            display_title: format_display_title(title, process_id),
            cache_origin,
        }
    }
}

/// Candidates ordered by process id with no duplicate ids.
///
/// The only way to build one is through [`CandidateSet::from_candidates`] (or
/// the equivalent `FromIterator`/`From` impls), which sorts and deduplicates,
/// so the invariant holds for every value including deserialized ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Candidate>", into = "Vec<Candidate>")]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by id and drop later duplicates (first occurrence wins).
    pub fn from_candidates(candidates: impl IntoIterator<Item = Candidate>) -> Self {
        let mut candidates: Vec<Candidate> = candidates.into_iter().collect();
        // stable sort keeps the first occurrence ahead of its duplicates
        candidates.sort_by_key(|c| c.process_id);
        candidates.dedup_by_key(|c| c.process_id);
        Self { candidates }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Candidate at a display position
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    #[must_use]
    pub fn get(&self, pid: ProcessId) -> Option<&Candidate> {
        self.candidates
            .binary_search_by_key(&pid, |c| c.process_id)
            .ok()
            .map(|i| &self.candidates[i])
    }

    #[must_use]
    pub fn contains(&self, pid: ProcessId) -> bool {
        self.get(pid).is_some()
    }

    #[must_use]
    pub fn pids(&self) -> BTreeSet<ProcessId> {
        self.candidates.iter().map(|c| c.process_id).collect()
    }

    /// Identity comparison: true when both sets cover the same process ids.
    /// Titles are deliberately ignored.
    #[must_use]
    pub fn same_processes(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .candidates
                .iter()
                .zip(other.candidates.iter())
                .all(|(a, b)| a.process_id == b.process_id)
    }
}

impl From<Vec<Candidate>> for CandidateSet {
    fn from(candidates: Vec<Candidate>) -> Self {
        Self::from_candidates(candidates)
    }
}

impl From<CandidateSet> for Vec<Candidate> {
    fn from(set: CandidateSet) -> Self {
        set.candidates
    }
}

impl FromIterator<Candidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self::from_candidates(iter)
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// What the orchestrator is currently doing. Exactly one is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    Scanning,
    Dragging,
    Launching,
}

impl Mode {
    /// Modes that hold the candidate list still: no scan cycle starts and
    /// nothing is published
    #[must_use]
    pub fn suppresses_scan(self) -> bool {
        matches!(self, Mode::Dragging | Mode::Launching)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Scanning => "scanning",
            Mode::Dragging => "dragging",
            Mode::Launching => "launching",
        }
    }
}

/// Process-wide orchestration flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_launch_target: Option<ProcessId>,
    /// Launch progress in `[0, 1]`
    pub progress: f32,
}

/// Updates sent from core to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreUpdate {
    /// A new candidate set was published; rebuild the visible list
    CandidatesChanged { candidates: CandidateSet },

    /// Mode transitioned
    ModeChanged {
        mode: Mode,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<ProcessId>,
    },

    /// Launch progress advanced
    LaunchProgress { pid: ProcessId, progress: f32 },

    /// The launcher script was started (or the attempt failed)
    LaunchSpawned {
        pid: ProcessId,
        #[serde(skip_serializing_if = "Option::is_none")]
        script: Option<PathBuf>,
        ok: bool,
    },

    /// Progress reached 1.0; presentation may close
    LaunchCompleted { pid: ProcessId },
}

/// Intents forwarded from the presentation layer into core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserIntent {
    /// User picked a candidate
    Select { pid: ProcessId },
    /// Pointer drag began on the window
    DragStarted,
    /// Pointer drag ended; triggers an immediate rescan
    DragEnded,
    /// User asked to close
    Close,
}
