//! Scenario, determinism and property tests for the scheduler.
//!
//! # Test Structure
//!
//! - `helpers.rs`: fixture catalog, session builders and a recording presenter
//! - `scenarios.rs`: end-to-end cast, interrupt and forced-action scenarios
//! - `determinism.rs`: same seed and commands give identical battles
//! - `properties.rs`: proptest invariants over random command sequences

mod helpers;
mod properties;

pub use helpers::*;
