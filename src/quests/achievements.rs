//! One-shot achievements and the lifetime counters that feed them.

use crate::character::Rank;
use crate::core::constants::{
    DUNGEON_MASTER_CLEARS, MAX_LEVEL_ACHIEVEMENT, SHADOW_COLLECTOR_SOLDIERS, WEALTHY_GOLD,
};
use crate::core::rewards::RewardBundle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AchievementId {
    FirstKill,
    DungeonMaster,
    ShadowCollector,
    Wealthy,
    MaxLevel,
    RankSss,
}

impl AchievementId {
    pub const ALL: [AchievementId; 6] = [
        AchievementId::FirstKill,
        AchievementId::DungeonMaster,
        AchievementId::ShadowCollector,
        AchievementId::Wealthy,
        AchievementId::MaxLevel,
        AchievementId::RankSss,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AchievementId::FirstKill => "First Blood",
            AchievementId::DungeonMaster => "Dungeon Master",
            AchievementId::ShadowCollector => "Shadow Collector",
            AchievementId::Wealthy => "Wealthy",
            AchievementId::MaxLevel => "Peak of Power",
            AchievementId::RankSss => "Shadow Monarch",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AchievementId::FirstKill => "Defeat your first enemy",
            AchievementId::DungeonMaster => "Clear 10 dungeons",
            AchievementId::ShadowCollector => "Command 20 shadow soldiers",
            AchievementId::Wealthy => "Hold 100,000 gold",
            AchievementId::MaxLevel => "Reach level 100",
            AchievementId::RankSss => "Reach rank SSS",
        }
    }

    pub fn reward(&self) -> RewardBundle {
        match self {
            AchievementId::FirstKill => RewardBundle::new(100, 500),
            AchievementId::DungeonMaster => RewardBundle::new(1000, 5000).with_skill_points(5),
            AchievementId::ShadowCollector => RewardBundle::new(500, 2000),
            AchievementId::Wealthy => RewardBundle::new(1000, 10_000),
            AchievementId::MaxLevel => RewardBundle::new(0, 100_000).with_skill_points(20),
            AchievementId::RankSss => RewardBundle::new(0, 500_000).with_skill_points(50),
        }
    }
}

/// State owned by other engines that some achievements look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementInputs {
    pub level: u32,
    pub rank: Rank,
    pub soldier_count: usize,
    pub gold: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementUnlock {
    pub id: AchievementId,
    pub name: &'static str,
    pub rewards: RewardBundle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievements {
    /// Unlock timestamps (ms).
    #[serde(default)]
    unlocked: BTreeMap<AchievementId, i64>,
    #[serde(default)]
    pub total_kills: u64,
    #[serde(default)]
    pub dungeons_cleared: u64,
}

impl Achievements {
    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.unlocked.contains_key(&id)
    }

    pub fn unlocked_at(&self, id: AchievementId) -> Option<i64> {
        self.unlocked.get(&id).copied()
    }

    pub fn unlocked_ids(&self) -> Vec<AchievementId> {
        self.unlocked.keys().copied().collect()
    }

    /// Unlock an achievement. Returns true if newly unlocked.
    pub fn unlock(&mut self, id: AchievementId, now: i64) -> bool {
        if self.is_unlocked(id) {
            return false;
        }
        self.unlocked.insert(id, now);
        true
    }

    pub fn on_enemy_killed(&mut self) {
        self.total_kills = self.total_kills.saturating_add(1);
    }

    pub fn on_dungeon_cleared(&mut self) {
        self.dungeons_cleared = self.dungeons_cleared.saturating_add(1);
    }

    fn is_earned(&self, id: AchievementId, inputs: &AchievementInputs) -> bool {
        match id {
            AchievementId::FirstKill => self.total_kills >= 1,
            AchievementId::DungeonMaster => self.dungeons_cleared >= DUNGEON_MASTER_CLEARS,
            AchievementId::ShadowCollector => inputs.soldier_count >= SHADOW_COLLECTOR_SOLDIERS,
            AchievementId::Wealthy => inputs.gold >= WEALTHY_GOLD,
            AchievementId::MaxLevel => inputs.level >= MAX_LEVEL_ACHIEVEMENT,
            AchievementId::RankSss => inputs.rank == Rank::SSS,
        }
    }

    /// Unlocks everything newly earned and returns those unlocks with
    /// their rewards. Already-unlocked achievements never pay again.
    pub fn check(&mut self, inputs: &AchievementInputs, now: i64) -> Vec<AchievementUnlock> {
        let earned: Vec<AchievementId> = AchievementId::ALL
            .into_iter()
            .filter(|id| !self.is_unlocked(*id) && self.is_earned(*id, inputs))
            .collect();

        earned
            .into_iter()
            .filter(|id| self.unlock(*id, now))
            .map(|id| AchievementUnlock {
                id,
                name: id.name(),
                rewards: id.reward(),
            })
            .collect()
    }
}
