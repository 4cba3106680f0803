//! Level, experience and rank state machine.

use super::derived_stats::DerivedStats;
use super::rank::{Rank, Unlock};
use super::stats::{StatBonuses, StatType, Stats};
use crate::core::constants::{
    LEVEL_UP_STAT_POINTS, PROGRESSION_SAVE_KEY, STARTING_EXP_TO_NEXT, STARTING_LEVEL,
};
use crate::core::error::{GameError, GameResult};
use crate::persistence::Persistent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Experience needed for the level after one that required `current`.
///
/// Integer form of `floor(current * 1.5)`.
pub fn next_exp_requirement(current: u64) -> u64 {
    current.saturating_add(current / 2)
}

/// Experience needed to go from `level` to `level + 1`.
pub fn exp_requirement_for_level(level: u32) -> u64 {
    (STARTING_LEVEL..level.max(STARTING_LEVEL))
        .fold(STARTING_EXP_TO_NEXT, |req, _| next_exp_requirement(req))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankChange {
    pub from: Rank,
    pub to: Rank,
}

/// What happened during a single `gain_exp` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpGainReport {
    pub exp_gained: u64,
    pub level_before: u32,
    pub level_after: u32,
    pub levels_gained: u32,
    pub points_granted: u32,
    pub rank_change: Option<RankChange>,
    /// Unlocks fired for the first time by this call, in rank order.
    pub unlocks: Vec<Unlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatAllocation {
    pub stat: StatType,
    pub points: u32,
    pub new_value: u32,
    pub available_points: u32,
    pub derived: DerivedStats,
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressionSnapshot {
    pub rank: Rank,
    pub rank_multiplier: f64,
    pub level: u32,
    pub exp: u64,
    pub exp_to_next: u64,
    pub stats: Stats,
    pub effective_stats: Stats,
    pub available_points: u32,
    pub unlocks: Vec<Unlock>,
    pub derived: DerivedStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionEngine {
    rank: Rank,
    level: u32,
    exp: u64,
    exp_to_next: u64,
    stats: Stats,
    available_points: u32,
    #[serde(default)]
    unlocks: BTreeSet<Unlock>,
    /// Rebuilt from the inventory's equipped items after every load.
    #[serde(skip)]
    equipment_overlay: StatBonuses,
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionEngine {
    /// A fresh rank E, level 1 character.
    pub fn new() -> Self {
        Self {
            rank: Rank::E,
            level: STARTING_LEVEL,
            exp: 0,
            exp_to_next: STARTING_EXP_TO_NEXT,
            stats: Stats::new(),
            available_points: 0,
            unlocks: BTreeSet::new(),
            equipment_overlay: StatBonuses::new(),
        }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn exp(&self) -> u64 {
        self.exp
    }

    pub fn exp_to_next(&self) -> u64 {
        self.exp_to_next
    }

    pub fn available_points(&self) -> u32 {
        self.available_points
    }

    /// Allocated stats, without equipment.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn equipment_overlay(&self) -> &StatBonuses {
        &self.equipment_overlay
    }

    /// Allocated stats plus the equipment overlay.
    pub fn effective_stats(&self) -> Stats {
        let mut total = self.stats;
        total.add(&self.equipment_overlay.stats);
        total
    }

    pub fn charisma(&self) -> u32 {
        self.effective_stats().get(StatType::Charisma)
    }

    pub fn derived(&self) -> DerivedStats {
        DerivedStats::calculate(&self.stats, &self.equipment_overlay)
    }

    pub fn rank_multiplier(&self) -> f64 {
        self.rank.multiplier()
    }

    pub fn has_unlock(&self, unlock: Unlock) -> bool {
        self.unlocks.contains(&unlock)
    }

    pub fn unlocks(&self) -> impl Iterator<Item = Unlock> + '_ {
        self.unlocks.iter().copied()
    }

    /// Adds experience and processes every level-up it pays for.
    pub fn gain_exp(&mut self, amount: u64) -> ExpGainReport {
        let level_before = self.level;
        let rank_before = self.rank;
        let mut report = ExpGainReport {
            exp_gained: amount,
            level_before,
            ..Default::default()
        };

        self.exp = self.exp.saturating_add(amount);

        while self.exp >= self.exp_to_next {
            self.exp -= self.exp_to_next;
            self.level = self.level.saturating_add(1);
            self.exp_to_next = next_exp_requirement(self.exp_to_next);
            self.available_points = self.available_points.saturating_add(LEVEL_UP_STAT_POINTS);
            report.points_granted += LEVEL_UP_STAT_POINTS;
            report.unlocks.extend(self.check_rank_up());
        }

        report.level_after = self.level;
        report.levels_gained = self.level - level_before;
        if self.rank != rank_before {
            report.rank_change = Some(RankChange {
                from: rank_before,
                to: self.rank,
            });
            tracing::info!(from = %rank_before, to = %self.rank, "rank up");
        }
        if report.levels_gained > 0 {
            tracing::debug!(
                level = self.level,
                levels = report.levels_gained,
                "level up"
            );
        }

        report
    }

    /// Moves the rank up to the highest threshold the level has reached,
    /// firing the unlock of every rank passed on the way.
    fn check_rank_up(&mut self) -> Vec<Unlock> {
        let target = Rank::for_level(self.level);
        if target <= self.rank {
            return Vec::new();
        }

        let fired = self.record_unlocks_through(target);
        self.rank = target;
        fired
    }

    fn record_unlocks_through(&mut self, target: Rank) -> Vec<Unlock> {
        let mut fired = Vec::new();
        for rank in Rank::E.path_to(target) {
            if let Some(unlock) = rank.unlock() {
                if self.unlocks.insert(unlock) {
                    fired.push(unlock);
                }
            }
        }
        fired
    }

    /// Spends unallocated points on a stat.
    pub fn allocate_stat(&mut self, stat: StatType, points: u32) -> GameResult<StatAllocation> {
        if points == 0 {
            return Err(GameError::InvalidState(
                "stat allocation needs at least one point".to_string(),
            ));
        }
        if self.available_points < points {
            return Err(GameError::InsufficientPoints {
                available: self.available_points,
                requested: points,
            });
        }

        self.available_points -= points;
        self.stats.increase(stat, points);

        Ok(StatAllocation {
            stat,
            points,
            new_value: self.stats.get(stat),
            available_points: self.available_points,
            derived: self.derived(),
        })
    }

    /// Grants unallocated points from quest or achievement rewards.
    pub fn grant_skill_points(&mut self, points: u32) {
        self.available_points = self.available_points.saturating_add(points);
    }

    /// Replaces the equipment overlay with the inventory's current totals.
    pub fn set_equipment_overlay(&mut self, overlay: StatBonuses) -> DerivedStats {
        self.equipment_overlay = overlay;
        self.derived()
    }

    /// Repairs a loaded state: rank catches up with level, stored overflow
    /// experience is rolled into levels, and unlocks for every reached rank
    /// are present. Returns the full unlock set so collaborators can re-apply
    /// them.
    pub fn normalize(&mut self) -> Vec<Unlock> {
        self.level = self.level.max(STARTING_LEVEL);
        if self.exp_to_next == 0 {
            self.exp_to_next = exp_requirement_for_level(self.level);
        }
        self.rank = self.rank.max(Rank::for_level(self.level));
        let rank = self.rank;
        self.record_unlocks_through(rank);
        self.gain_exp(0);
        self.unlocks.iter().copied().collect()
    }

    pub fn snapshot(&self) -> ProgressionSnapshot {
        ProgressionSnapshot {
            rank: self.rank,
            rank_multiplier: self.rank.multiplier(),
            level: self.level,
            exp: self.exp,
            exp_to_next: self.exp_to_next,
            stats: self.stats,
            effective_stats: self.effective_stats(),
            available_points: self.available_points,
            unlocks: self.unlocks.iter().copied().collect(),
            derived: self.derived(),
        }
    }
}

impl Persistent for ProgressionEngine {
    const SAVE_KEY: &'static str = PROGRESSION_SAVE_KEY;
}
