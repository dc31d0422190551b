use hitch_types::ProcessId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Process enumeration failed: {0}")]
    Enumeration(String),

    #[error("Window query failed: {0}")]
    WindowQuery(String),

    #[error("Launch script error: {0}")]
    Artifact(String),

    #[error("Spawn error: {0}")]
    Spawn(String),

    #[error("Launch already in progress for PID {pid}")]
    AlreadyLaunching { pid: ProcessId },

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;
