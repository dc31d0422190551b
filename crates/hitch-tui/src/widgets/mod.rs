//! Custom widgets for the hitch TUI

mod gauge;

pub use gauge::LaunchGauge;
