//! Shadow Monarch - progression and shadow-army simulation core.
//!
//! Engines own their state and never call each other; `core::GameContext`
//! routes rewards, unlocks and timers between them and persists each engine
//! under its own key.

pub mod army;
pub mod build_info;
pub mod character;
pub mod core;
pub mod items;
pub mod persistence;
pub mod quests;
pub mod simulator;

pub use crate::core::{GameConfig, GameContext, GameError, GameResult};
