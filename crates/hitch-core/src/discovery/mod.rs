//! Process discovery: enumerate running processes and keep the ones that
//! look like eligible hosts.

mod system;

pub use system::SystemProcessSource;

use crate::Result;
use crate::config::{MatchMode, TargetConfig};
use hitch_types::ProcessId;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

/// One row of the OS process table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: ProcessId,
    pub name: String,
    /// `None` when the command line is unreadable at our privilege level
    pub cmdline: Option<String>,
}

/// Anything that can list the processes currently visible to us
pub trait ProcessSource: Send + Sync {
    /// List visible processes.
    ///
    /// # Errors
    ///
    /// Returns an error only when the whole enumeration fails. Individual
    /// processes that vanish or deny access are simply absent or carry no
    /// command line.
    fn processes(&self) -> Result<Vec<ProcessEntry>>;
}

/// Extract the base name from a path, handling both Unix (/) and Windows (\) separators
fn extract_base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Decides whether a process is a candidate host
#[derive(Debug, Clone)]
pub struct TargetPredicate {
    name: Regex,
    keywords: Vec<String>,
    mode: MatchMode,
}

impl TargetPredicate {
    /// Build a predicate. Keywords are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `Error::Regex` if `name_pattern` does not compile.
    pub fn new(name_pattern: &str, keywords: &[String], mode: MatchMode) -> Result<Self> {
        Ok(Self {
            name: Regex::new(name_pattern)?,
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            mode,
        })
    }

    /// # Errors
    ///
    /// Returns `Error::Regex` if the configured name pattern does not compile.
    pub fn from_config(config: &TargetConfig) -> Result<Self> {
        Self::new(
            &config.name_pattern,
            &config.command_keywords,
            config.match_mode,
        )
    }

    /// Evaluate against a process name and, in strict mode, its command line.
    ///
    /// Strict mode with an unreadable command line never matches: we cannot
    /// confirm the process is the one we want. Strict mode without keywords
    /// degrades to a name match.
    #[must_use]
    pub fn matches(&self, name: &str, cmdline: Option<&str>) -> bool {
        if name.is_empty() || !self.name.is_match(extract_base_name(name)) {
            return false;
        }

        match self.mode {
            MatchMode::Name => true,
            MatchMode::Strict if self.keywords.is_empty() => true,
            MatchMode::Strict => {
                let Some(cmdline) = cmdline.filter(|c| !c.trim().is_empty()) else {
                    return false;
                };
                let cmdline = cmdline.to_lowercase();
                self.keywords.iter().any(|k| cmdline.contains(k))
            }
        }
    }
}

/// Enumerate processes and return the ids that satisfy `predicate`.
///
/// # Errors
///
/// Propagates a failure of the enumeration as a whole; per-process failures
/// are skipped.
pub fn snapshot(
    source: &dyn ProcessSource,
    predicate: &TargetPredicate,
) -> Result<BTreeSet<ProcessId>> {
    let processes = source.processes()?;
    let total = processes.len();

    let found: BTreeSet<ProcessId> = processes
        .into_iter()
        .filter(|p| predicate.matches(&p.name, p.cmdline.as_deref()))
        .map(|p| p.pid)
        .collect();

    debug!(
        total,
        matched = found.len(),
        "Process snapshot complete"
    );
    Ok(found)
}
