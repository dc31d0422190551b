//! Decide whether a freshly resolved candidate set is worth publishing.

use hitch_types::CandidateSet;

/// True when `candidate` covers a different set of processes than `previous`.
///
/// Only process ids take part; a title that changes under a stable id does not
/// count, which keeps window-title flicker from rebuilding the list.
#[must_use]
pub fn has_changed(previous: &CandidateSet, candidate: &CandidateSet) -> bool {
    !previous.same_processes(candidate)
}
