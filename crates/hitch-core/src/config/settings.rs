use super::Directories;
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub launch: LaunchConfig,

    /// Preflight script started once, detached, when the app starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_check: Option<PathBuf>,
}

impl Config {
    /// Load config from file. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid JSON, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "config.json");
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scanner or sequencer cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the offending field, or `Error::Regex`
    /// when the name pattern does not compile.
    pub fn validate(&self) -> Result<()> {
        self.target.name_regex()?;

        if self.scan.idle_interval_ms == 0 || self.scan.active_interval_ms == 0 {
            return Err(Error::Config(
                "scan intervals must be greater than zero".to_string(),
            ));
        }
        if self.launch.total_steps == 0 {
            return Err(Error::Config(
                "launch.totalSteps must be greater than zero".to_string(),
            ));
        }
        if !(self.launch.spawn_threshold > 0.0 && self.launch.spawn_threshold <= 1.0) {
            return Err(Error::Config(format!(
                "launch.spawnThreshold must be in (0, 1], got {}",
                self.launch.spawn_threshold
            )));
        }
        if self.launch.program.trim().is_empty() {
            return Err(Error::Config("launch.program must not be empty".to_string()));
        }
        Ok(())
    }
}

/// How strictly a process must match to become a candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Process name alone decides
    Name,
    /// Name must match and the command line must contain a keyword
    #[default]
    Strict,
}

/// Which processes are eligible hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetConfig {
    /// Regex evaluated against the process name
    pub name_pattern: String,

    /// Any of these (case-insensitive) in the command line satisfies strict mode
    pub command_keywords: Vec<String>,

    pub match_mode: MatchMode,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            name_pattern: r"(?i)java".to_string(),
            command_keywords: vec!["minecraft".to_string(), "net.minecraft".to_string()],
            match_mode: MatchMode::Strict,
        }
    }
}

impl TargetConfig {
    /// Compile the name pattern.
    ///
    /// # Errors
    ///
    /// Returns `Error::Regex` if the pattern is invalid.
    pub fn name_regex(&self) -> Result<Regex> {
        Ok(Regex::new(&self.name_pattern)?)
    }
}

/// Scan loop timing and identity resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// Sleep between cycles while nothing is published
    pub idle_interval_ms: u64,

    /// Sleep between cycles once candidates are published
    pub active_interval_ms: u64,

    /// Hard budget for resolving one window title
    pub resolve_deadline_ms: u64,

    /// Pause between window enumerations inside the budget
    pub resolve_poll_ms: u64,

    /// Title used when no window qualifies in time
    pub sentinel_title: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            idle_interval_ms: 1000,
            active_interval_ms: 2500,
            resolve_deadline_ms: 100,
            resolve_poll_ms: 10,
            sentinel_title: "No Title".to_string(),
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    #[must_use]
    pub fn active_interval(&self) -> Duration {
        Duration::from_millis(self.active_interval_ms)
    }

    #[must_use]
    pub fn resolve_deadline(&self) -> Duration {
        Duration::from_millis(self.resolve_deadline_ms)
    }

    #[must_use]
    pub fn resolve_poll(&self) -> Duration {
        Duration::from_millis(self.resolve_poll_ms)
    }
}

/// External launcher invocation and progress timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchConfig {
    pub program: String,

    /// Fixed flags placed before the target PID
    pub args: Vec<String>,

    /// Directory the launcher runs in; defaults to the executable's directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Where one-shot scripts are written; defaults to the working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_dir: Option<PathBuf>,

    pub total_steps: u32,

    pub duration_ms: u64,

    /// Progress fraction at which the launcher is started
    pub spawn_threshold: f32,

    /// Whether the presentation exits once progress completes
    pub close_on_complete: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            args: vec![
                "--add-opens".to_string(),
                "java.base/java.lang=ALL-UNNAMED".to_string(),
                "-jar".to_string(),
                "launcher.jar".to_string(),
            ],
            working_dir: None,
            script_dir: None,
            total_steps: 1000,
            duration_ms: 3605,
            spawn_threshold: 0.01,
            close_on_complete: true,
        }
    }
}

impl LaunchConfig {
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    #[must_use]
    pub fn resolved_working_dir(&self, dirs: &Directories) -> PathBuf {
        self.working_dir
            .clone()
            .unwrap_or_else(|| dirs.launcher.clone())
    }

    #[must_use]
    pub fn resolved_script_dir(&self, dirs: &Directories) -> PathBuf {
        self.script_dir
            .clone()
            .unwrap_or_else(|| self.resolved_working_dir(dirs))
    }
}
