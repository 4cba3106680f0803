use crate::core::constants::{BASE_STAT_VALUE, NUM_STATS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StatType {
    Strength,
    Agility,
    Endurance,
    Intelligence,
    Perception,
    Charisma,
}

impl StatType {
    pub fn all() -> [StatType; NUM_STATS] {
        [
            StatType::Strength,
            StatType::Agility,
            StatType::Endurance,
            StatType::Intelligence,
            StatType::Perception,
            StatType::Charisma,
        ]
    }

    pub fn abbrev(&self) -> &str {
        match self {
            StatType::Strength => "STR",
            StatType::Agility => "AGI",
            StatType::Endurance => "END",
            StatType::Intelligence => "INT",
            StatType::Perception => "PER",
            StatType::Charisma => "CHA",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            StatType::Strength => 0,
            StatType::Agility => 1,
            StatType::Endurance => 2,
            StatType::Intelligence => 3,
            StatType::Perception => 4,
            StatType::Charisma => 5,
        }
    }
}

/// The six character stats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    values: [u32; NUM_STATS],
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    /// Starting stats for a new character.
    pub fn new() -> Self {
        Self {
            values: [BASE_STAT_VALUE; NUM_STATS],
        }
    }

    /// All stats at zero, used for bonus overlays.
    pub fn zero() -> Self {
        Self {
            values: [0; NUM_STATS],
        }
    }

    pub fn get(&self, stat: StatType) -> u32 {
        self.values[stat.index()]
    }

    pub fn set(&mut self, stat: StatType, value: u32) {
        self.values[stat.index()] = value;
    }

    pub fn increase(&mut self, stat: StatType, amount: u32) {
        self.values[stat.index()] = self.values[stat.index()].saturating_add(amount);
    }

    /// Points above the starting value, zero if below it.
    pub fn above_base(&self, stat: StatType) -> u32 {
        self.get(stat).saturating_sub(BASE_STAT_VALUE)
    }

    /// Adds another set of values to this one (for equipment bonuses).
    pub fn add(&mut self, other: &Stats) {
        for stat in StatType::all() {
            self.increase(stat, other.get(stat));
        }
    }

    pub fn total(&self) -> u32 {
        self.values.iter().sum()
    }
}

/// Additive bonuses granted by equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBonuses {
    pub stats: Stats,
    #[serde(default)]
    pub health: u32,
    #[serde(default)]
    pub mana: u32,
    #[serde(default)]
    pub damage: u32,
    #[serde(default)]
    pub defense: u32,
}

impl Default for StatBonuses {
    fn default() -> Self {
        Self::new()
    }
}

impl StatBonuses {
    pub fn new() -> Self {
        Self {
            stats: Stats::zero(),
            health: 0,
            mana: 0,
            damage: 0,
            defense: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::new()
    }

    pub fn add(&mut self, other: &StatBonuses) {
        self.stats.add(&other.stats);
        self.health = self.health.saturating_add(other.health);
        self.mana = self.mana.saturating_add(other.mana);
        self.damage = self.damage.saturating_add(other.damage);
        self.defense = self.defense.saturating_add(other.defense);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats() {
        let stats = Stats::new();
        for stat in StatType::all() {
            assert_eq!(stats.get(stat), 10);
            assert_eq!(stats.above_base(stat), 0);
        }
    }

    #[test]
    fn test_increase_saturates_at_max() {
        let mut stats = Stats::new();
        stats.set(StatType::Agility, u32::MAX);
        stats.increase(StatType::Agility, 5);
        assert_eq!(stats.get(StatType::Agility), u32::MAX);
    }

    #[test]
    fn test_index_returns_unique_values() {
        for (i, stat) in StatType::all().iter().enumerate() {
            assert_eq!(stat.index(), i);
        }
    }

    #[test]
    fn test_add_combines_stats() {
        let mut base = Stats::new();
        let mut bonus = Stats::zero();
        bonus.set(StatType::Strength, 3);
        bonus.set(StatType::Charisma, 7);
        base.add(&bonus);

        assert_eq!(base.get(StatType::Strength), 13);
        assert_eq!(base.get(StatType::Charisma), 17);
        assert_eq!(base.get(StatType::Perception), 10);
        assert_eq!(base.total(), 70);
    }

    #[test]
    fn test_bonuses_add_and_empty() {
        let mut total = StatBonuses::new();
        assert!(total.is_empty());

        let mut sword = StatBonuses::new();
        sword.damage = 6;
        sword.stats.set(StatType::Strength, 2);
        total.add(&sword);
        total.add(&sword);

        assert!(!total.is_empty());
        assert_eq!(total.damage, 12);
        assert_eq!(total.stats.get(StatType::Strength), 4);
    }
}
