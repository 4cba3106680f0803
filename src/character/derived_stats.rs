use super::stats::{StatBonuses, StatType, Stats};
use crate::core::constants::*;
use serde::Serialize;

/// Values collaborating systems read from the character's stats.
///
/// Nothing here is stored; it is recomputed from allocated stats plus the
/// equipment overlay whenever it is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedStats {
    pub max_health: u32,
    pub max_mana: u32,
    pub damage: f64,
    pub damage_multiplier: f64,
    pub defense: u32,
    pub attack_speed_multiplier: f64,
    /// Multiply skill cooldowns by this (1.0 = unchanged).
    pub cooldown_factor: f64,
    pub army_capacity_bonus: usize,
}

impl DerivedStats {
    pub fn from_stats(stats: &Stats) -> Self {
        Self::calculate(stats, &StatBonuses::new())
    }

    /// Calculates derived values from allocated stats and equipment bonuses.
    ///
    /// Equipment stat bonuses are added before the per-point formulas; flat
    /// health, mana, damage and defense bonuses are added afterwards.
    pub fn calculate(stats: &Stats, overlay: &StatBonuses) -> Self {
        let mut total = *stats;
        total.add(&overlay.stats);

        let strength = total.above_base(StatType::Strength) as f64;
        let agility = total.above_base(StatType::Agility) as f64;

        // Damage = BASE_DAMAGE + 1.1 per strength point above base
        let damage = BASE_DAMAGE + strength * DAMAGE_PER_STRENGTH + overlay.damage as f64;
        let attack_speed_multiplier = 1.0 + agility * ATTACK_SPEED_PER_AGILITY;

        Self {
            max_health: BASE_MAX_HEALTH
                + total.above_base(StatType::Endurance) * HEALTH_PER_ENDURANCE
                + overlay.health,
            max_mana: BASE_MAX_MANA
                + total.above_base(StatType::Intelligence) * MANA_PER_INTELLIGENCE
                + overlay.mana,
            damage,
            damage_multiplier: damage / BASE_DAMAGE,
            defense: overlay.defense,
            attack_speed_multiplier,
            cooldown_factor: (1.0 / attack_speed_multiplier).max(MIN_COOLDOWN_FACTOR),
            army_capacity_bonus: capacity_bonus(total.get(StatType::Charisma)),
        }
    }
}

/// Extra army slots granted by charisma.
pub fn capacity_bonus(charisma: u32) -> usize {
    (charisma / CHARISMA_PER_CAPACITY_SLOT) as usize
}
