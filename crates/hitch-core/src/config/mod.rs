mod dirs;
mod settings;
mod validation;

pub use dirs::Directories;
pub use settings::{Config, LaunchConfig, MatchMode, ScanConfig, TargetConfig};
pub use validation::warn_unknown_fields;
