use crate::{Error, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Application directories following platform conventions
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config file path (~/.config/hitch/config.json)
    pub config_file: PathBuf,

    /// Directory holding the external launcher (next to the binary)
    pub launcher: PathBuf,
}

impl Directories {
    /// Create a new `Directories` instance with standard paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the system's project directories cannot be determined.
    pub fn new() -> Result<Self> {
        let project = ProjectDirs::from("", "", "hitch").ok_or_else(|| {
            Error::Config("Failed to determine project directories".to_string())
        })?;

        Ok(Self {
            config_file: project.config_dir().join("config.json"),
            launcher: Self::find_launcher_dir(),
        })
    }

    #[must_use]
    pub fn with_base(base: &Path) -> Self {
        Self {
            config_file: base.join("config.json"),
            launcher: base.join("launcher"),
        }
    }

    /// The launcher ships next to the binary; fall back to the current directory.
    fn find_launcher_dir() -> PathBuf {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            return exe_dir.to_path_buf();
        }

        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}
