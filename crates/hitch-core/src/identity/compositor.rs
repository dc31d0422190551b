//! Window listing through Wayland compositor IPC (Hyprland, Niri)

use super::{WindowInfo, WindowSource};
use crate::{Error, Result};
use serde::Deserialize;
use std::process::{Command, Stdio};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorType {
    Hyprland,
    Niri,
    Unknown,
}

/// Lists windows by asking the running compositor
#[derive(Debug, Clone, Copy)]
pub struct CompositorWindows {
    compositor_type: CompositorType,
}

impl CompositorWindows {
    pub fn detect() -> Self {
        let compositor_type = if std::env::var("HYPRLAND_INSTANCE_SIGNATURE").is_ok() {
            CompositorType::Hyprland
        } else if std::env::var("NIRI_SOCKET").is_ok() {
            CompositorType::Niri
        } else {
            CompositorType::Unknown
        };

        info!("Detected compositor: {:?}", compositor_type);
        Self { compositor_type }
    }
}

impl WindowSource for CompositorWindows {
    fn windows(&self) -> Result<Vec<WindowInfo>> {
        match self.compositor_type {
            CompositorType::Hyprland => {
                parse_hyprland_clients(&run_json_command("hyprctl", &["clients", "-j"])?)
            }
            CompositorType::Niri => {
                parse_niri_windows(&run_json_command("niri", &["msg", "--json", "windows"])?)
            }
            CompositorType::Unknown => Ok(Vec::new()),
        }
    }
}

fn run_json_command(program: &str, args: &[&str]) -> Result<Vec<u8>> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| Error::WindowQuery(format!("Failed to run {program}: {e}")))?;

    if !output.status.success() {
        return Err(Error::WindowQuery(format!(
            "{program} failed with status: {}",
            output.status
        )));
    }

    Ok(output.stdout)
}

fn parse_hyprland_clients(json: &[u8]) -> Result<Vec<WindowInfo>> {
    #[derive(Deserialize)]
    struct HyprlandClient {
        title: String,
        pid: i64,
        #[serde(default = "default_true")]
        mapped: bool,
        #[serde(default)]
        hidden: bool,
    }

    let clients: Vec<HyprlandClient> = serde_json::from_slice(json)
        .map_err(|e| Error::WindowQuery(format!("Failed to parse hyprctl clients output: {e}")))?;

    Ok(clients
        .into_iter()
        .filter_map(|c| {
            let owner_pid = u32::try_from(c.pid).ok()?;
            Some(WindowInfo {
                owner_pid,
                visible: c.mapped && !c.hidden,
                title: c.title,
            })
        })
        .collect())
}

fn parse_niri_windows(json: &[u8]) -> Result<Vec<WindowInfo>> {
    #[derive(Deserialize)]
    struct NiriWindow {
        title: Option<String>,
        pid: Option<i64>,
    }

    let windows: Vec<NiriWindow> = serde_json::from_slice(json)
        .map_err(|e| Error::WindowQuery(format!("Failed to parse niri msg windows output: {e}")))?;

    // niri only lists mapped windows
    Ok(windows
        .into_iter()
        .filter_map(|w| {
            let owner_pid = u32::try_from(w.pid?).ok()?;
            Some(WindowInfo {
                owner_pid,
                visible: true,
                title: w.title.unwrap_or_default(),
            })
        })
        .collect())
}

fn default_true() -> bool {
    true
}
