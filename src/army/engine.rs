//! The shadow army: roster, capacity, extraction and missions.

use super::extraction::{extraction_chance, soldier_type_for, Caster, EnemyDescriptor, ExtractionOutcome};
use super::formation::Formation;
use super::missions::{calculate_rewards, Mission, MissionId, MissionType};
use super::soldier::{Evolution, Soldier, SoldierId};
use crate::character::derived_stats::capacity_bonus;
use crate::character::rank::{Rank, Unlock};
use crate::core::constants::{
    ARMY_SAVE_KEY, LOYALTY_REGEN_PER_HOUR, MAX_LOYALTY, MS_PER_HOUR,
    SOLDIER_DISMISS_REFUND_PER_LEVEL,
};
use crate::core::error::{GameError, GameResult};
use crate::items::types::Item;
use crate::persistence::Persistent;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Army slots granted by rank alone.
pub fn base_capacity(rank: Rank) -> usize {
    match rank {
        Rank::E => 0,
        Rank::D => 5,
        Rank::C => 10,
        Rank::B => 20,
        Rank::A => 35,
        Rank::S => 50,
        Rank::SS => 75,
        Rank::SSS => 100,
    }
}

pub fn max_capacity(rank: Rank, charisma: u32) -> usize {
    base_capacity(rank) + capacity_bonus(charisma)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelUpReport {
    pub soldier_id: SoldierId,
    pub level: u32,
    pub evolution: Option<Evolution>,
}

/// Everything a finished mission produced. Gold and items still have to be
/// deposited by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionReport {
    pub mission_id: MissionId,
    pub mission_type: MissionType,
    pub soldier_ids: Vec<SoldierId>,
    pub exp_per_soldier: u64,
    pub gold: u64,
    pub items: Vec<Item>,
    /// Soldiers that gained levels, with their new level.
    pub level_ups: Vec<(SoldierId, u32)>,
    pub evolutions: Vec<(SoldierId, Evolution)>,
    /// Soldiers that came back with no loyalty left and deserted.
    pub rebels: Vec<Soldier>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapacityChange {
    pub max_capacity: usize,
    pub deactivated: Vec<SoldierId>,
    pub reactivated: Vec<SoldierId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmySnapshot {
    pub max_capacity: usize,
    pub soldier_count: usize,
    pub active_count: usize,
    pub formation: Formation,
    pub power: f64,
    pub extraction_unlocked: bool,
    pub army_unlocked: bool,
    pub soldiers: Vec<Soldier>,
    pub missions: Vec<Mission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyEngine {
    roster: BTreeMap<SoldierId, Soldier>,
    #[serde(default)]
    missions: BTreeMap<MissionId, Mission>,
    next_soldier_id: SoldierId,
    next_mission_id: MissionId,
    max_capacity: usize,
    /// Hunter rank at the last capacity update; values mission loot.
    #[serde(default)]
    rank: Rank,
    #[serde(default)]
    formation: Formation,
    #[serde(default)]
    extraction_unlocked: bool,
    #[serde(default)]
    army_unlocked: bool,
}

impl Default for ArmyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ArmyEngine {
    pub fn new() -> Self {
        Self {
            roster: BTreeMap::new(),
            missions: BTreeMap::new(),
            next_soldier_id: 1,
            next_mission_id: 1,
            max_capacity: 0,
            rank: Rank::E,
            formation: Formation::Default,
            extraction_unlocked: false,
            army_unlocked: false,
        }
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn soldier_count(&self) -> usize {
        self.roster.len()
    }

    pub fn is_full(&self) -> bool {
        self.roster.len() >= self.max_capacity
    }

    pub fn soldier(&self, id: SoldierId) -> Option<&Soldier> {
        self.roster.get(&id)
    }

    /// Roster in id (extraction) order.
    pub fn soldiers(&self) -> impl Iterator<Item = &Soldier> {
        self.roster.values()
    }

    pub fn active_soldiers(&self) -> impl Iterator<Item = &Soldier> {
        self.roster.values().filter(|s| s.active)
    }

    pub fn idle_soldier_ids(&self) -> Vec<SoldierId> {
        self.roster
            .values()
            .filter(|s| s.active && !s.is_busy())
            .map(|s| s.id)
            .collect()
    }

    pub fn mission(&self, id: MissionId) -> Option<&Mission> {
        self.missions.get(&id)
    }

    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.values()
    }

    pub fn formation(&self) -> Formation {
        self.formation
    }

    pub fn is_extraction_unlocked(&self) -> bool {
        self.extraction_unlocked
    }

    pub fn is_army_unlocked(&self) -> bool {
        self.army_unlocked
    }

    /// Applies a rank unlock. Re-applying is a no-op.
    pub fn apply_unlock(&mut self, unlock: Unlock) {
        match unlock {
            Unlock::ShadowExtraction => self.extraction_unlocked = true,
            Unlock::ShadowArmy => self.army_unlocked = true,
            Unlock::AdvancedEvolution | Unlock::MonarchPowers => {}
        }
    }

    /// Attempts to turn a defeated enemy into a soldier.
    ///
    /// A full roster fails with `CapacityExceeded` before anything is rolled.
    /// A failed roll changes nothing.
    pub fn extract_soldier(
        &mut self,
        enemy: &EnemyDescriptor,
        caster: Caster,
        now: i64,
        rng: &mut impl Rng,
    ) -> GameResult<ExtractionOutcome> {
        if self.is_full() {
            return Err(GameError::CapacityExceeded {
                capacity: self.max_capacity,
            });
        }

        let chance = extraction_chance(caster.rank, caster.charisma, enemy.tier);
        if rng.gen::<f64>() >= chance {
            tracing::debug!(enemy = %enemy.kind, chance, "extraction failed");
            return Ok(ExtractionOutcome::Failed { chance });
        }

        let id = self.next_soldier_id;
        self.next_soldier_id += 1;
        let soldier = Soldier::new(id, soldier_type_for(&enemy.kind), enemy.tier, &enemy.kind, now);
        tracing::info!(id, name = %soldier.name, tier = enemy.tier.name(), "shadow extracted");
        self.roster.insert(id, soldier);

        Ok(ExtractionOutcome::Extracted {
            soldier_id: id,
            chance,
        })
    }

    /// Raises a soldier one level. Its experience resets to zero.
    pub fn level_up_soldier(&mut self, id: SoldierId) -> GameResult<LevelUpReport> {
        let soldier = self
            .roster
            .get_mut(&id)
            .ok_or_else(|| GameError::not_found("soldier", id))?;

        soldier.exp = 0;
        let evolution = soldier.grow();
        if let Some(evo) = evolution {
            tracing::info!(id, from = evo.from.name(), to = evo.to.name(), "soldier evolved");
        }

        Ok(LevelUpReport {
            soldier_id: id,
            level: soldier.level,
            evolution,
        })
    }

    /// Sends idle, active soldiers away. Rewards are rolled now and paid on
    /// completion.
    pub fn send_on_mission(
        &mut self,
        ids: &[SoldierId],
        mission_type: MissionType,
        now: i64,
        rng: &mut impl Rng,
    ) -> GameResult<Mission> {
        if ids.is_empty() {
            return Err(GameError::InvalidSelection(
                "no soldiers selected".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        let mut power = 0u64;
        for &id in ids {
            if !seen.insert(id) {
                return Err(GameError::InvalidSelection(format!(
                    "soldier {} selected twice",
                    id
                )));
            }
            let soldier = self
                .roster
                .get(&id)
                .ok_or_else(|| GameError::InvalidSelection(format!("unknown soldier {}", id)))?;
            if soldier.is_busy() {
                return Err(GameError::InvalidSelection(format!(
                    "{} #{} is already on a mission",
                    soldier.name, id
                )));
            }
            if !soldier.active {
                return Err(GameError::InvalidSelection(format!(
                    "{} #{} is inactive",
                    soldier.name, id
                )));
            }
            power += soldier.power();
        }

        let id = self.next_mission_id;
        self.next_mission_id += 1;
        let end_time = now + mission_type.duration_ms();
        let rewards = calculate_rewards(power, mission_type, ids.len(), self.rank, rng);

        for soldier_id in ids {
            if let Some(soldier) = self.roster.get_mut(soldier_id) {
                soldier.mission = Some(id);
                soldier.mission_end_time = Some(end_time);
                soldier.loyalty = soldier.loyalty.saturating_sub(mission_type.loyalty_cost());
            }
        }

        let mission = Mission {
            id,
            mission_type,
            soldier_ids: ids.to_vec(),
            started_at: now,
            end_time,
            rewards,
        };
        self.missions.insert(id, mission.clone());
        tracing::info!(
            mission = id,
            kind = mission_type.name(),
            soldiers = ids.len(),
            "mission dispatched"
        );

        Ok(mission)
    }

    /// Missions whose end time has passed, soonest first.
    pub fn due_missions(&self, now: i64) -> Vec<MissionId> {
        let mut due: Vec<&Mission> = self.missions.values().filter(|m| m.is_due(now)).collect();
        due.sort_by_key(|m| (m.end_time, m.id));
        due.into_iter().map(|m| m.id).collect()
    }

    /// Finishes a mission. `None` if it was already completed or cancelled.
    pub fn complete_mission(&mut self, id: MissionId) -> Option<MissionReport> {
        let mission = self.missions.remove(&id)?;
        let mut report = MissionReport {
            mission_id: id,
            mission_type: mission.mission_type,
            soldier_ids: mission.soldier_ids.clone(),
            exp_per_soldier: mission.rewards.exp,
            gold: mission.rewards.gold,
            items: mission.rewards.items,
            level_ups: Vec::new(),
            evolutions: Vec::new(),
            rebels: Vec::new(),
        };

        for soldier_id in &mission.soldier_ids {
            let Some(soldier) = self.roster.get_mut(soldier_id) else {
                continue;
            };
            if soldier.mission != Some(id) {
                continue;
            }
            soldier.mission = None;
            soldier.mission_end_time = None;
            soldier.loyalty_clock = mission.end_time;

            if soldier.loyalty == 0 {
                if let Some(rebel) = self.roster.remove(soldier_id) {
                    tracing::warn!(id = rebel.id, name = %rebel.name, "soldier rebelled");
                    report.rebels.push(rebel);
                }
                continue;
            }

            let (levels, evolutions) = soldier.gain_exp(mission.rewards.exp);
            if levels > 0 {
                report.level_ups.push((soldier.id, soldier.level));
            }
            report
                .evolutions
                .extend(evolutions.into_iter().map(|evo| (*soldier_id, evo)));
        }

        if !report.rebels.is_empty() {
            self.assign_active_slots();
        }
        tracing::info!(mission = id, gold = report.gold, "mission complete");
        Some(report)
    }

    /// Recalls a mission early. Soldiers come back without rewards and keep
    /// the loyalty they spent.
    pub fn cancel_mission(&mut self, id: MissionId, now: i64) -> GameResult<Vec<SoldierId>> {
        let mission = self
            .missions
            .remove(&id)
            .ok_or_else(|| GameError::not_found("mission", id))?;

        for soldier_id in &mission.soldier_ids {
            if let Some(soldier) = self.roster.get_mut(soldier_id) {
                soldier.mission = None;
                soldier.mission_end_time = None;
                soldier.loyalty_clock = now;
            }
        }
        Ok(mission.soldier_ids)
    }

    /// Recomputes capacity for a new rank or charisma. Soldiers beyond the
    /// new capacity (newest first) become inactive; they are never removed.
    pub fn update_capacity(&mut self, rank: Rank, charisma: u32) -> CapacityChange {
        self.rank = rank;
        self.max_capacity = max_capacity(rank, charisma);
        let mut change = self.assign_active_slots();
        change.max_capacity = self.max_capacity;
        if !change.deactivated.is_empty() {
            tracing::warn!(
                count = change.deactivated.len(),
                capacity = self.max_capacity,
                "army over capacity, soldiers deactivated"
            );
        }
        change
    }

    /// The oldest `max_capacity` soldiers are active, the rest inactive.
    fn assign_active_slots(&mut self) -> CapacityChange {
        let mut change = CapacityChange {
            max_capacity: self.max_capacity,
            ..Default::default()
        };
        for (index, soldier) in self.roster.values_mut().enumerate() {
            let should_be_active = index < self.max_capacity;
            if soldier.active && !should_be_active {
                change.deactivated.push(soldier.id);
            } else if !soldier.active && should_be_active {
                change.reactivated.push(soldier.id);
            }
            soldier.active = should_be_active;
        }
        change
    }

    /// Releases a soldier for `level * 10` gold.
    pub fn dismiss_soldier(&mut self, id: SoldierId) -> GameResult<u64> {
        let soldier = self
            .roster
            .get(&id)
            .ok_or_else(|| GameError::not_found("soldier", id))?;
        if soldier.is_busy() {
            return Err(GameError::InvalidState(format!(
                "{} #{} is on a mission",
                soldier.name, id
            )));
        }

        let refund = soldier.level as u64 * SOLDIER_DISMISS_REFUND_PER_LEVEL;
        self.roster.remove(&id);
        self.assign_active_slots();
        Ok(refund)
    }

    pub fn set_formation(&mut self, formation: Formation) {
        self.formation = formation;
    }

    /// Formation-weighted strength of every active soldier.
    pub fn army_power(&self) -> f64 {
        let dm = self.formation.damage_multiplier();
        let df = self.formation.defense_multiplier();
        self.active_soldiers()
            .map(|s| (s.stats.damage as f64 * dm + s.stats.defense as f64 * df) * s.level as f64)
            .sum()
    }

    /// Restores loyalty to idle soldiers for every full hour since it was
    /// last settled. Returns how many soldiers gained loyalty.
    pub fn regen_loyalty(&mut self, now: i64) -> usize {
        let mut restored = 0;
        for soldier in self.roster.values_mut().filter(|s| !s.is_busy()) {
            let hours = (now - soldier.loyalty_clock) / MS_PER_HOUR;
            if hours <= 0 {
                continue;
            }
            soldier.loyalty_clock += hours * MS_PER_HOUR;
            if soldier.loyalty < MAX_LOYALTY {
                let gain = (hours as u64 * LOYALTY_REGEN_PER_HOUR as u64).min(MAX_LOYALTY as u64);
                soldier.loyalty = (soldier.loyalty as u64 + gain).min(MAX_LOYALTY as u64) as u8;
                restored += 1;
            }
        }
        restored
    }

    /// Repairs a loaded state: id counters move past every stored id and
    /// soldiers pointing at a mission that no longer exists are freed.
    pub fn normalize(&mut self) {
        if let Some(max_id) = self.roster.keys().max() {
            self.next_soldier_id = self.next_soldier_id.max(max_id + 1);
        }
        if let Some(max_id) = self.missions.keys().max() {
            self.next_mission_id = self.next_mission_id.max(max_id + 1);
        }
        for soldier in self.roster.values_mut() {
            if let Some(mission_id) = soldier.mission {
                if !self.missions.contains_key(&mission_id) {
                    soldier.mission = None;
                    soldier.mission_end_time = None;
                }
            }
        }
    }

    pub fn snapshot(&self) -> ArmySnapshot {
        ArmySnapshot {
            max_capacity: self.max_capacity,
            soldier_count: self.roster.len(),
            active_count: self.active_soldiers().count(),
            formation: self.formation,
            power: self.army_power(),
            extraction_unlocked: self.extraction_unlocked,
            army_unlocked: self.army_unlocked,
            soldiers: self.roster.values().cloned().collect(),
            missions: self.missions.values().cloned().collect(),
        }
    }
}

impl Persistent for ArmyEngine {
    const SAVE_KEY: &'static str = ARMY_SAVE_KEY;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::army::soldier::{SoldierType, Tier};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn strong_caster() -> Caster {
        // 0.3 + 0.7 + ... clamps to 0.95
        Caster {
            rank: Rank::SSS,
            charisma: 100,
        }
    }

    /// Extracts until `count` soldiers joined.
    fn army_with(count: usize) -> ArmyEngine {
        let mut army = ArmyEngine::new();
        army.update_capacity(Rank::D, 10);
        let mut rng = rng();
        let goblin = EnemyDescriptor::new("goblin", Tier::Common);
        while army.soldier_count() < count {
            army.extract_soldier(&goblin, strong_caster(), 0, &mut rng).unwrap();
        }
        army
    }

    #[test]
    fn test_base_capacity_table() {
        assert_eq!(max_capacity(Rank::E, 10), 1);
        assert_eq!(max_capacity(Rank::D, 10), 6);
        assert_eq!(max_capacity(Rank::SSS, 55), 105);
    }

    #[test]
    fn test_extract_on_full_roster_fails_without_mutation() {
        let mut army = ArmyEngine::new();
        army.update_capacity(Rank::E, 0);
        let before = army.clone();

        let err = army
            .extract_soldier(
                &EnemyDescriptor::new("goblin", Tier::Common),
                strong_caster(),
                0,
                &mut rng(),
            )
            .unwrap_err();
        assert!(matches!(err, GameError::CapacityExceeded { capacity: 0 }));
        assert_eq!(army, before);
    }

    #[test]
    fn test_failed_extraction_changes_nothing() {
        let mut army = ArmyEngine::new();
        army.update_capacity(Rank::D, 0);
        let before = army.clone();
        let caster = Caster {
            rank: Rank::E,
            charisma: 0,
        };

        // Legendary at E with no charisma has zero chance
        let outcome = army
            .extract_soldier(&EnemyDescriptor::new("dragon", Tier::Legendary), caster, 0, &mut rng())
            .unwrap();
        assert_eq!(outcome, ExtractionOutcome::Failed { chance: 0.0 });
        assert_eq!(army, before);
    }

    #[test]
    fn test_successful_extraction_seeds_from_tier() {
        let mut army = ArmyEngine::new();
        army.update_capacity(Rank::D, 0);
        let mut rng = rng();
        let orc = EnemyDescriptor::new("orc", Tier::Elite);

        let id = loop {
            if let Some(id) = army
                .extract_soldier(&orc, strong_caster(), 1_000, &mut rng)
                .unwrap()
                .soldier_id()
            {
                break id;
            }
        };

        let soldier = army.soldier(id).unwrap();
        assert_eq!(soldier.soldier_type, SoldierType::Warrior);
        assert_eq!(soldier.tier, Tier::Elite);
        assert_eq!(soldier.stats.health, 150);
        assert_eq!(soldier.source, "orc");
        assert_eq!(soldier.loyalty, 100);
    }

    #[test]
    fn test_roster_never_exceeds_capacity() {
        let mut army = army_with(6);
        assert_eq!(army.max_capacity(), 6);
        let err = army.extract_soldier(
            &EnemyDescriptor::new("goblin", Tier::Common),
            strong_caster(),
            0,
            &mut rng(),
        );
        assert!(err.is_err());
        assert_eq!(army.soldier_count(), 6);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let army = army_with(4);
        let ids: Vec<_> = army.soldiers().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_level_up_soldier() {
        let mut army = army_with(1);
        let report = army.level_up_soldier(1).unwrap();
        assert_eq!(report.level, 2);
        assert!(report.evolution.is_none());
        assert!(matches!(
            army.level_up_soldier(99),
            Err(GameError::NotFound { .. })
        ));
    }

    #[test]
    fn test_send_on_mission_validation() {
        let mut army = army_with(3);
        let mut rng = rng();

        assert!(matches!(
            army.send_on_mission(&[], MissionType::Short, 0, &mut rng),
            Err(GameError::InvalidSelection(_))
        ));
        assert!(matches!(
            army.send_on_mission(&[1, 1], MissionType::Short, 0, &mut rng),
            Err(GameError::InvalidSelection(_))
        ));
        assert!(matches!(
            army.send_on_mission(&[1, 42], MissionType::Short, 0, &mut rng),
            Err(GameError::InvalidSelection(_))
        ));
        // Nothing was marked busy by the failed attempts
        assert!(army.soldiers().all(|s| !s.is_busy()));

        army.send_on_mission(&[1, 2], MissionType::Short, 0, &mut rng).unwrap();
        assert!(matches!(
            army.send_on_mission(&[2, 3], MissionType::Long, 0, &mut rng),
            Err(GameError::InvalidSelection(_))
        ));
        assert!(!army.soldier(3).unwrap().is_busy());
    }

    #[test]
    fn test_mission_dispatch_marks_soldiers() {
        let mut army = army_with(2);
        let mission = army
            .send_on_mission(&[1, 2], MissionType::Medium, 10_000, &mut rng())
            .unwrap();

        assert_eq!(mission.end_time, 10_000 + 30 * 60 * 1000);
        // Two fresh common soldiers: power 30, medium multiplier 3
        assert_eq!(mission.rewards.exp, 9);
        assert_eq!(mission.rewards.gold, 45);
        assert_eq!(mission.rewards.items.len(), 2);

        let soldier = army.soldier(1).unwrap();
        assert_eq!(soldier.mission, Some(mission.id));
        assert_eq!(soldier.mission_end_time, Some(mission.end_time));
        assert_eq!(soldier.loyalty, 95);
    }

    #[test]
    fn test_complete_mission_is_idempotent() {
        let mut army = army_with(2);
        let mission = army
            .send_on_mission(&[1, 2], MissionType::Overnight, 0, &mut rng())
            .unwrap();

        assert!(army.due_missions(mission.end_time - 1).is_empty());
        assert_eq!(army.due_missions(mission.end_time), vec![mission.id]);

        let report = army.complete_mission(mission.id).unwrap();
        assert_eq!(report.gold, mission.rewards.gold);
        assert_eq!(report.items.len(), 2);
        assert!(army.soldiers().all(|s| !s.is_busy()));

        assert!(army.complete_mission(mission.id).is_none());
        assert!(army.due_missions(i64::MAX).is_empty());
    }

    #[test]
    fn test_mission_exp_carries_over_levels() {
        let mut army = army_with(1);
        // Overnight: 15 power * 0.1 * 25 = 37 exp, not enough for a level
        let mission = army
            .send_on_mission(&[1], MissionType::Overnight, 0, &mut rng())
            .unwrap();
        army.complete_mission(mission.id);
        assert_eq!(army.soldier(1).unwrap().exp, 37);
        assert_eq!(army.soldier(1).unwrap().level, 1);

        for _ in 0..2 {
            let mission = army
                .send_on_mission(&[1], MissionType::Overnight, 0, &mut rng())
                .unwrap();
            army.complete_mission(mission.id);
        }
        let soldier = army.soldier(1).unwrap();
        assert_eq!(soldier.level, 2);
        assert_eq!(soldier.exp, 11);
    }

    #[test]
    fn test_zero_loyalty_soldier_rebels_on_return() {
        let mut army = army_with(2);
        army.roster.get_mut(&1).unwrap().loyalty = 15;

        let mission = army
            .send_on_mission(&[1, 2], MissionType::Overnight, 0, &mut rng())
            .unwrap();
        let report = army.complete_mission(mission.id).unwrap();

        assert_eq!(report.rebels.len(), 1);
        assert_eq!(report.rebels[0].id, 1);
        assert!(army.soldier(1).is_none());
        assert!(army.soldier(2).is_some());
        assert_eq!(report.gold, mission.rewards.gold);
    }

    #[test]
    fn test_cancel_mission_frees_soldiers_without_rewards() {
        let mut army = army_with(2);
        let mission = army
            .send_on_mission(&[1, 2], MissionType::Long, 0, &mut rng())
            .unwrap();

        let freed = army.cancel_mission(mission.id, 1_000).unwrap();
        assert_eq!(freed, vec![1, 2]);
        assert!(army.soldiers().all(|s| !s.is_busy() && s.exp == 0));
        assert!(army.complete_mission(mission.id).is_none());
        assert!(matches!(
            army.cancel_mission(mission.id, 1_000),
            Err(GameError::NotFound { .. })
        ));
    }

    #[test]
    fn test_capacity_drop_deactivates_newest_and_restores() {
        let mut army = army_with(6);

        let change = army.update_capacity(Rank::E, 20);
        assert_eq!(change.max_capacity, 2);
        assert_eq!(change.deactivated, vec![3, 4, 5, 6]);
        assert_eq!(army.soldier_count(), 6);
        assert_eq!(army.active_soldiers().count(), 2);

        assert!(matches!(
            army.send_on_mission(&[5], MissionType::Short, 0, &mut rng()),
            Err(GameError::InvalidSelection(_))
        ));

        let change = army.update_capacity(Rank::D, 10);
        assert_eq!(change.reactivated, vec![3, 4, 5, 6]);
        assert_eq!(army.active_soldiers().count(), 6);
    }

    #[test]
    fn test_dismiss_soldier() {
        let mut army = army_with(2);
        army.level_up_soldier(1).unwrap();
        army.level_up_soldier(1).unwrap();

        assert_eq!(army.dismiss_soldier(1).unwrap(), 30);
        assert!(army.soldier(1).is_none());
        assert!(matches!(
            army.dismiss_soldier(1),
            Err(GameError::NotFound { .. })
        ));

        army.send_on_mission(&[2], MissionType::Short, 0, &mut rng()).unwrap();
        assert!(matches!(
            army.dismiss_soldier(2),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_formation_changes_power() {
        let mut army = army_with(1);
        // damage 10, defense 5, level 1
        assert!((army.army_power() - 15.0).abs() < 1e-9);
        army.set_formation(Formation::Offensive);
        assert!((army.army_power() - 17.0).abs() < 1e-9);
        army.set_formation(Formation::Defensive);
        assert!((army.army_power() - 15.5).abs() < 1e-9);
    }

    #[test]
    fn test_loyalty_regenerates_per_full_idle_hour() {
        let mut army = army_with(1);
        army.roster.get_mut(&1).unwrap().loyalty = 50;

        assert_eq!(army.regen_loyalty(MS_PER_HOUR - 1), 0);
        assert_eq!(army.regen_loyalty(3 * MS_PER_HOUR + 10), 1);
        assert_eq!(army.soldier(1).unwrap().loyalty, 65);

        army.regen_loyalty(100 * MS_PER_HOUR);
        assert_eq!(army.soldier(1).unwrap().loyalty, 100);
    }

    #[test]
    fn test_busy_soldiers_do_not_regenerate() {
        let mut army = army_with(1);
        army.send_on_mission(&[1], MissionType::Overnight, 0, &mut rng()).unwrap();
        army.regen_loyalty(5 * MS_PER_HOUR);
        assert_eq!(army.soldier(1).unwrap().loyalty, 80);
    }

    #[test]
    fn test_unlock_flags() {
        let mut army = ArmyEngine::new();
        assert!(!army.is_extraction_unlocked());
        army.apply_unlock(Unlock::ShadowExtraction);
        army.apply_unlock(Unlock::ShadowExtraction);
        assert!(army.is_extraction_unlocked());
        assert!(!army.is_army_unlocked());
        army.apply_unlock(Unlock::ShadowArmy);
        assert!(army.is_army_unlocked());
    }

    #[test]
    fn test_serialization_round_trip_with_mission() {
        let mut army = army_with(2);
        army.send_on_mission(&[1], MissionType::Medium, 0, &mut rng()).unwrap();

        let json = serde_json::to_value(&army).unwrap();
        let mut loaded: ArmyEngine = serde_json::from_value(json).unwrap();
        loaded.normalize();
        assert_eq!(loaded, army);
    }

    #[test]
    fn test_normalize_frees_dangling_mission_refs() {
        let mut army = army_with(1);
        let mission = army
            .send_on_mission(&[1], MissionType::Short, 0, &mut rng())
            .unwrap();
        army.missions.remove(&mission.id);
        army.next_soldier_id = 0;

        army.normalize();
        assert!(!army.soldier(1).unwrap().is_busy());
        assert_eq!(army.next_soldier_id, 2);
    }
}
