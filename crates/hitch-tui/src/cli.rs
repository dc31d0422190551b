//! CLI argument parsing for hitch.

use clap::{Parser, Subcommand};
use hitch_core::ProcessId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hitch")]
#[command(about = "Find a running host process and start the launcher against it", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (the TUI logs to hitch.log in the temp directory)
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive TUI mode (default)
    Tui,

    /// Run one scan and print the candidates
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Launch against a PID without the TUI
    Launch {
        /// Target process id
        pid: ProcessId,
    },
}

impl Commands {
    /// Commands that write to the terminal directly and log to stderr.
    #[must_use]
    pub fn is_headless(&self) -> bool {
        !matches!(self, Self::Tui)
    }
}
