//! Headless session simulator for balance analysis.
//!
//! Runs many seeded play sessions against a `GameContext` backed by
//! in-memory storage and aggregates:
//! - Level and rank pacing
//! - Extraction rates and army growth
//! - Mission throughput and desertions
//! - Quest and achievement payouts

mod config;
mod report;
mod runner;

pub use config::SimConfig;
pub use report::{RunStats, SimReport};
pub use runner::{run_simulation, simulate_single_run, SIM_START_MS};
