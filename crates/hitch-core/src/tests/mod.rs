//! Test module for hitch-core
//!
//! Covers the pieces that only make sense together:
//! - Discovery, title resolution and publication across scan cycles
//! - Scan loop guards, failure recovery and drag-triggered rescans
//! - Launch exclusivity, spawn timing and guaranteed mode release

// Test modules use exact float comparisons
#![allow(clippy::float_cmp)]

mod launch_tests;
mod scan_loop_tests;
