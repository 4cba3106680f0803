//! Shadow soldiers: types, tiers, stats and per-soldier leveling.

use super::missions::MissionId;
use crate::core::constants::{
    MAX_LOYALTY, SOLDIER_BASE_DAMAGE, SOLDIER_BASE_DEFENSE, SOLDIER_BASE_HEALTH,
    SOLDIER_BASE_SPEED, SOLDIER_EVOLUTION_LEVELS, SOLDIER_EVOLUTION_MULTIPLIER,
    SOLDIER_EXP_PER_LEVEL,
};
use serde::{Deserialize, Serialize};

pub type SoldierId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoldierType {
    Infantry,
    Warrior,
    Knight,
    Paladin,
    Mage,
    Archmage,
    Dragon,
    AncientDragon,
}

impl SoldierType {
    pub fn name(&self) -> &'static str {
        match self {
            SoldierType::Infantry => "Infantry",
            SoldierType::Warrior => "Warrior",
            SoldierType::Knight => "Knight",
            SoldierType::Paladin => "Paladin",
            SoldierType::Mage => "Mage",
            SoldierType::Archmage => "Archmage",
            SoldierType::Dragon => "Dragon",
            SoldierType::AncientDragon => "Ancient Dragon",
        }
    }

    /// Next type in the evolution chain; `None` for terminal types.
    pub fn successor(&self) -> Option<SoldierType> {
        match self {
            SoldierType::Infantry => Some(SoldierType::Warrior),
            SoldierType::Warrior => Some(SoldierType::Knight),
            SoldierType::Knight => Some(SoldierType::Paladin),
            SoldierType::Mage => Some(SoldierType::Archmage),
            SoldierType::Dragon => Some(SoldierType::AncientDragon),
            SoldierType::Paladin | SoldierType::Archmage | SoldierType::AncientDragon => None,
        }
    }
}

/// Strength class of an extracted unit, independent of the hunter's rank.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Tier {
    #[default]
    Common,
    Uncommon,
    Rare,
    Elite,
    Boss,
    Legendary,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Common,
        Tier::Uncommon,
        Tier::Rare,
        Tier::Elite,
        Tier::Boss,
        Tier::Legendary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Common => "common",
            Tier::Uncommon => "uncommon",
            Tier::Rare => "rare",
            Tier::Elite => "elite",
            Tier::Boss => "boss",
            Tier::Legendary => "legendary",
        }
    }

    /// Unknown names fall back to Common.
    pub fn from_name(name: &str) -> Tier {
        Tier::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    /// Multiplier applied to base soldier stats at extraction.
    pub fn stat_multiplier(&self) -> f64 {
        match self {
            Tier::Common => 1.0,
            Tier::Uncommon => 1.5,
            Tier::Rare => 2.0,
            Tier::Elite => 3.0,
            Tier::Boss => 4.0,
            Tier::Legendary => 5.0,
        }
    }

    /// Per-level stat growth.
    pub fn growth_rate(&self) -> f64 {
        match self {
            Tier::Common => 1.1,
            Tier::Uncommon => 1.15,
            Tier::Rare => 1.2,
            Tier::Elite | Tier::Boss => 1.25,
            Tier::Legendary => 1.3,
        }
    }

    /// Added to the extraction chance; tougher tiers are harder to extract.
    pub fn extraction_modifier(&self) -> f64 {
        match self {
            Tier::Common => 0.1,
            Tier::Uncommon => 0.05,
            Tier::Rare => 0.0,
            Tier::Elite => -0.1,
            Tier::Boss => -0.2,
            Tier::Legendary => -0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoldierStats {
    pub health: u32,
    pub damage: u32,
    pub defense: u32,
    pub speed: f64,
}

impl SoldierStats {
    pub fn for_tier(tier: Tier) -> Self {
        let m = tier.stat_multiplier();
        Self {
            health: (SOLDIER_BASE_HEALTH as f64 * m) as u32,
            damage: (SOLDIER_BASE_DAMAGE as f64 * m) as u32,
            defense: (SOLDIER_BASE_DEFENSE as f64 * m) as u32,
            speed: SOLDIER_BASE_SPEED * m,
        }
    }

    /// Scales health, damage and defense, flooring each. Speed is untouched.
    pub fn scale(&mut self, factor: f64) {
        self.health = (self.health as f64 * factor) as u32;
        self.damage = (self.damage as f64 * factor) as u32;
        self.defense = (self.defense as f64 * factor) as u32;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evolution {
    pub from: SoldierType,
    pub to: SoldierType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Soldier {
    pub id: SoldierId,
    pub name: String,
    pub soldier_type: SoldierType,
    pub tier: Tier,
    pub level: u32,
    pub exp: u64,
    pub stats: SoldierStats,
    /// Mission the soldier is away on.
    #[serde(default)]
    pub mission: Option<MissionId>,
    #[serde(default)]
    pub mission_end_time: Option<i64>,
    #[serde(default = "full_loyalty")]
    pub loyalty: u8,
    /// Last time idle loyalty regeneration was settled (Unix ms).
    #[serde(default)]
    pub loyalty_clock: i64,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Enemy kind the soldier was extracted from.
    #[serde(default)]
    pub source: String,
}

fn full_loyalty() -> u8 {
    MAX_LOYALTY
}

fn default_active() -> bool {
    true
}

/// Display name for a soldier of this type.
pub fn shadow_name(soldier_type: SoldierType) -> String {
    format!("Shadow {}", soldier_type.name())
}

impl Soldier {
    pub fn new(
        id: SoldierId,
        soldier_type: SoldierType,
        tier: Tier,
        source: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            id,
            name: shadow_name(soldier_type),
            soldier_type,
            tier,
            level: 1,
            exp: 0,
            stats: SoldierStats::for_tier(tier),
            mission: None,
            mission_end_time: None,
            loyalty: MAX_LOYALTY,
            loyalty_clock: now,
            active: true,
            source: source.into(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.mission.is_some()
    }

    /// `(damage + defense) * level`, the unit of mission rewards.
    pub fn power(&self) -> u64 {
        (self.stats.damage as u64 + self.stats.defense as u64) * self.level as u64
    }

    pub fn exp_to_next(&self) -> u64 {
        self.level as u64 * SOLDIER_EXP_PER_LEVEL
    }

    /// One level of growth, evolving at the checkpoint levels. Experience is
    /// left to the caller.
    pub(crate) fn grow(&mut self) -> Option<Evolution> {
        self.level = self.level.saturating_add(1);
        self.stats.scale(self.tier.growth_rate());

        if SOLDIER_EVOLUTION_LEVELS.contains(&self.level) {
            self.evolve()
        } else {
            None
        }
    }

    fn evolve(&mut self) -> Option<Evolution> {
        let to = self.soldier_type.successor()?;
        let from = self.soldier_type;
        self.soldier_type = to;
        self.name = shadow_name(to);
        self.stats.scale(SOLDIER_EVOLUTION_MULTIPLIER);
        Some(Evolution { from, to })
    }

    /// Adds experience and levels up while it pays for the next level,
    /// carrying the remainder over.
    pub(crate) fn gain_exp(&mut self, amount: u64) -> (u32, Vec<Evolution>) {
        self.exp = self.exp.saturating_add(amount);
        let mut levels = 0;
        let mut evolutions = Vec::new();
        while self.exp >= self.exp_to_next() && self.exp_to_next() > 0 {
            self.exp -= self.exp_to_next();
            levels += 1;
            evolutions.extend(self.grow());
        }
        (levels, evolutions)
    }
}
