//! Terminal UI pieces for hitch.
//!
//! The binary drives an [`hitch_core::Orchestrator`]; this library holds the
//! widgets it renders with.

pub mod widgets;
