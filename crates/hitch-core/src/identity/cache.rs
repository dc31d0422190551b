use hitch_types::ProcessId;
use std::collections::{BTreeSet, HashMap};

/// Resolved titles keyed by process id.
///
/// Entries are written once and never replaced; they leave only when their id
/// disappears from a snapshot.
#[derive(Debug, Clone, Default)]
pub struct TitleCache {
    entries: HashMap<ProcessId, String>,
}

impl TitleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, pid: ProcessId) -> Option<&str> {
        self.entries.get(&pid).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, pid: ProcessId) -> bool {
        self.entries.contains_key(&pid)
    }

    /// Store `title` unless an entry already exists; returns the stored title.
    pub fn insert_if_absent(&mut self, pid: ProcessId, title: String) -> &str {
        self.entries.entry(pid).or_insert(title)
    }

    /// Drop every entry whose id is not in `alive`. Returns the evicted ids.
    pub fn retain_only(&mut self, alive: &BTreeSet<ProcessId>) -> Vec<ProcessId> {
        let mut evicted: Vec<ProcessId> = self
            .entries
            .keys()
            .filter(|pid| !alive.contains(pid))
            .copied()
            .collect();
        evicted.sort_unstable();

        for pid in &evicted {
            self.entries.remove(pid);
        }
        evicted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
