//! One-shot launcher scripts.
//!
//! Each launch writes a fresh two-line script under a random name: the first
//! line switches the shell to UTF-8, the second runs the launcher with the
//! target PID as its last argument.

use crate::{Error, Result};
use hitch_types::ProcessId;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Length of the random part of a script name
pub const SCRIPT_NAME_LEN: usize = 6;

const MAX_NAME_ATTEMPTS: usize = 16;

/// Which shell a script is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// `cmd.exe` batch file
    Batch,
    /// POSIX `sh` script
    Shell,
}

impl ScriptKind {
    /// The flavour native to the current platform.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(windows) { Self::Batch } else { Self::Shell }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Batch => "bat",
            Self::Shell => "sh",
        }
    }

    /// Render the script body.
    #[must_use]
    pub fn render(self, program: &str, args: &[String], pid: ProcessId) -> String {
        let pid = pid.to_string();
        let words = std::iter::once(program)
            .chain(args.iter().map(String::as_str))
            .chain(std::iter::once(pid.as_str()));

        match self {
            Self::Batch => {
                let line = words.map(quote_batch).collect::<Vec<_>>().join(" ");
                format!("@chcp 65001 >nul\r\n@{line}\r\n")
            }
            Self::Shell => {
                let line = words.map(quote_shell).collect::<Vec<_>>().join(" ");
                format!("export LC_ALL=C.UTF-8\nexec {line}\n")
            }
        }
    }
}

fn quote_shell(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

fn quote_batch(word: &str) -> String {
    let escaped = word.replace('%', "%%");
    let plain = !escaped.is_empty() && !escaped.chars().any(|c| " \t\"&|<>^(),;=".contains(c));
    if plain {
        escaped
    } else {
        format!("\"{}\"", escaped.replace('"', "\"\""))
    }
}

/// Random alphanumeric stem for a script file.
#[must_use]
pub fn random_name() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SCRIPT_NAME_LEN)
        .map(char::from)
        .collect()
}

/// A script written to disk for a single launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptArtifact {
    path: PathBuf,
    kind: ScriptKind,
}

impl ScriptArtifact {
    /// Write a new script into `dir`. Never overwrites an existing file: a
    /// name collision draws a new name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Artifact` if the directory or file cannot be written,
    /// or if no unused name turned up.
    pub fn create(
        dir: &Path,
        kind: ScriptKind,
        program: &str,
        args: &[String],
        pid: ProcessId,
    ) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::Artifact(format!("Cannot create script directory {}: {e}", dir.display()))
        })?;

        let body = kind.render(program, args, pid);

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(format!("{}.{}", random_name(), kind.extension()));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Script name taken, drawing another");
                    continue;
                }
                Err(e) => {
                    return Err(Error::Artifact(format!(
                        "Cannot create {}: {e}",
                        path.display()
                    )));
                }
            };

            file.write_all(body.as_bytes())
                .and_then(|()| file.flush())
                .map_err(|e| Error::Artifact(format!("Cannot write {}: {e}", path.display())))?;

            debug!(pid, path = %path.display(), "Wrote launch script");
            return Ok(Self { path, kind });
        }

        Err(Error::Artifact(format!(
            "No unused script name in {} after {MAX_NAME_ATTEMPTS} attempts",
            dir.display()
        )))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn kind(&self) -> ScriptKind {
        self.kind
    }
}
