//! Hunter rank, stats, and level progression.

pub mod derived_stats;
pub mod progression;
pub mod rank;
pub mod stats;

pub use derived_stats::{capacity_bonus, DerivedStats};
pub use progression::{
    exp_requirement_for_level, next_exp_requirement, ExpGainReport, ProgressionEngine,
    ProgressionSnapshot, RankChange, StatAllocation,
};
pub use rank::{Rank, Unlock};
pub use stats::{StatBonuses, StatType, Stats};
