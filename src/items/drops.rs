//! Rarity tables and the cumulative rarity draw shared by dungeon loot and
//! mission rewards.

use super::types::Rarity;
use crate::character::rank::Rank;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Dungeon difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Normal,
    Hard,
    Hell,
    Real,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Hell,
        Difficulty::Real,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Hell => "hell",
            Difficulty::Real => "real",
        }
    }

    /// Unknown names fall back to Normal.
    pub fn from_name(name: &str) -> Difficulty {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Shifts loot away from Common.
    pub fn rarity_multiplier(&self) -> f64 {
        match self {
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.2,
            Difficulty::Hell => 1.5,
            Difficulty::Real => 2.0,
        }
    }

    pub fn gold_multiplier(&self) -> f64 {
        match self {
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
            Difficulty::Hell => 3.0,
            Difficulty::Real => 10.0,
        }
    }
}

/// Base drop chances for a dungeon of the given rank.
pub fn base_rarity_table(rank: Rank) -> &'static [(Rarity, f64)] {
    use Rarity::*;
    match rank {
        Rank::E => &[(Common, 0.9), (Uncommon, 0.1)],
        Rank::D => &[(Common, 0.8), (Uncommon, 0.2)],
        Rank::C => &[(Common, 0.7), (Uncommon, 0.25), (Rare, 0.05)],
        Rank::B => &[(Common, 0.6), (Uncommon, 0.3), (Rare, 0.1)],
        Rank::A => &[(Common, 0.5), (Uncommon, 0.3), (Rare, 0.15), (Epic, 0.05)],
        Rank::S => &[(Common, 0.4), (Uncommon, 0.3), (Rare, 0.2), (Epic, 0.1)],
        Rank::SS => &[
            (Common, 0.3),
            (Uncommon, 0.3),
            (Rare, 0.2),
            (Epic, 0.15),
            (Legendary, 0.05),
        ],
        Rank::SSS => &[
            (Common, 0.2),
            (Uncommon, 0.3),
            (Rare, 0.2),
            (Epic, 0.2),
            (Legendary, 0.1),
        ],
    }
}

/// Drop chances after difficulty scaling.
///
/// Common is divided by the difficulty multiplier and every other rarity is
/// multiplied by it; only then is the table renormalized to sum to 1.
pub fn rarity_chances(rank: Rank, difficulty: Difficulty) -> Vec<(Rarity, f64)> {
    let multiplier = difficulty.rarity_multiplier();
    let adjusted: Vec<(Rarity, f64)> = base_rarity_table(rank)
        .iter()
        .map(|&(rarity, chance)| {
            if rarity == Rarity::Common {
                (rarity, chance / multiplier)
            } else {
                (rarity, chance * multiplier)
            }
        })
        .collect();

    normalize(adjusted)
}

fn normalize(table: Vec<(Rarity, f64)>) -> Vec<(Rarity, f64)> {
    let total: f64 = table.iter().map(|(_, chance)| chance).sum();
    if total <= 0.0 {
        return vec![(Rarity::Common, 1.0)];
    }
    table
        .into_iter()
        .map(|(rarity, chance)| (rarity, chance / total))
        .collect()
}

/// Cumulative-probability draw over `table`.
///
/// Rounding slack past the last entry resolves to the last entry; an empty
/// table yields Common.
pub fn roll_rarity(table: &[(Rarity, f64)], rng: &mut impl Rng) -> Rarity {
    let roll = rng.gen::<f64>();
    let mut cumulative = 0.0;
    for &(rarity, chance) in table {
        cumulative += chance;
        if roll < cumulative {
            return rarity;
        }
    }
    table.last().map(|&(rarity, _)| rarity).unwrap_or_default()
}
