//! Extraction probability model and enemy-to-soldier templates.

use super::soldier::{SoldierId, SoldierType, Tier};
use crate::character::rank::Rank;
use crate::core::constants::{
    EXTRACTION_BASE_RATE, EXTRACTION_CHARISMA_FACTOR, EXTRACTION_MAX_RATE,
};
use serde::{Deserialize, Serialize};

/// A defeated enemy offered for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyDescriptor {
    /// Enemy kind, e.g. "goblin" or "dragon".
    pub kind: String,
    pub tier: Tier,
}

impl EnemyDescriptor {
    pub fn new(kind: impl Into<String>, tier: Tier) -> Self {
        Self {
            kind: kind.into(),
            tier,
        }
    }
}

/// The hunter attempting the extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caster {
    pub rank: Rank,
    pub charisma: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ExtractionOutcome {
    Extracted { soldier_id: SoldierId, chance: f64 },
    Failed { chance: f64 },
}

impl ExtractionOutcome {
    pub fn soldier_id(&self) -> Option<SoldierId> {
        match self {
            ExtractionOutcome::Extracted { soldier_id, .. } => Some(*soldier_id),
            ExtractionOutcome::Failed { .. } => None,
        }
    }

    pub fn chance(&self) -> f64 {
        match self {
            ExtractionOutcome::Extracted { chance, .. } | ExtractionOutcome::Failed { chance } => {
                *chance
            }
        }
    }
}

/// 0.0 at E rising by 0.1 per rank to 0.7 at SSS.
pub fn rank_bonus(rank: Rank) -> f64 {
    rank.index() as f64 * 0.1
}

/// `clamp(0.3 + rank_bonus + charisma * 0.01 + tier_modifier, 0, 0.95)`.
pub fn extraction_chance(rank: Rank, charisma: u32, tier: Tier) -> f64 {
    let raw = EXTRACTION_BASE_RATE
        + rank_bonus(rank)
        + charisma as f64 * EXTRACTION_CHARISMA_FACTOR
        + tier.extraction_modifier();
    raw.clamp(0.0, EXTRACTION_MAX_RATE)
}

/// Soldier type an enemy kind becomes. Unknown kinds become infantry.
pub fn soldier_type_for(kind: &str) -> SoldierType {
    match kind.trim().to_ascii_lowercase().as_str() {
        "orc" => SoldierType::Warrior,
        "mage" => SoldierType::Mage,
        "knight" => SoldierType::Knight,
        "dragon" => SoldierType::Dragon,
        _ => SoldierType::Infantry,
    }
}
