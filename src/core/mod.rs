//! Shared building blocks and the application context that wires the
//! engines together.

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod rewards;
pub mod scheduler;

pub use config::GameConfig;
pub use context::{
    now_ms, DefeatReport, DungeonClearReport, GameContext, GameContextBuilder, GameSnapshot,
    ProgressReport, RewardOutcome, TickReport,
};
pub use error::{ErrorKind, GameError, GameResult, PersistenceError};
pub use rewards::RewardBundle;
pub use scheduler::{Timer, TimerAction, TimerQueue};
