pub mod config;
pub mod discovery;
pub mod identity;
pub mod launch;
pub mod scan;
pub mod state;

pub(crate) mod diff;

mod error;
mod orchestrator;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use orchestrator::{Backends, Orchestrator};
pub use state::StateSnapshot;

pub use hitch_types::*;
