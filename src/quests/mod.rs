//! Quest log, daily rotation and achievements.

pub mod achievements;
pub mod daily;
pub mod engine;
pub mod types;

pub use achievements::{AchievementId, AchievementInputs, AchievementUnlock, Achievements};
pub use daily::{generate_daily_batch, next_daily_reset, DailyTemplate};
pub use engine::{QuestEngine, QuestSnapshot};
pub use types::{
    Objective, ObjectiveKind, Quest, QuestCompletion, QuestKind, QuestStatus, ANY_TARGET,
};
