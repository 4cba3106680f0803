//! Timed deployments and their reward tables.

use super::soldier::SoldierId;
use crate::character::rank::Rank;
use crate::core::constants::{MISSION_EXP_FACTOR, MISSION_GOLD_FACTOR, MS_PER_HOUR, MS_PER_MINUTE};
use crate::items::drops::roll_rarity;
use crate::items::generation::generate_item;
use crate::items::types::{Item, Rarity};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub type MissionId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionType {
    #[default]
    Short,
    Medium,
    Long,
    Overnight,
}

impl MissionType {
    pub const ALL: [MissionType; 4] = [
        MissionType::Short,
        MissionType::Medium,
        MissionType::Long,
        MissionType::Overnight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MissionType::Short => "short",
            MissionType::Medium => "medium",
            MissionType::Long => "long",
            MissionType::Overnight => "overnight",
        }
    }

    /// Unknown names fall back to Short.
    pub fn from_name(name: &str) -> MissionType {
        MissionType::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn duration_ms(&self) -> i64 {
        match self {
            MissionType::Short => 5 * MS_PER_MINUTE,
            MissionType::Medium => 30 * MS_PER_MINUTE,
            MissionType::Long => 2 * MS_PER_HOUR,
            MissionType::Overnight => 8 * MS_PER_HOUR,
        }
    }

    pub fn reward_multiplier(&self) -> f64 {
        match self {
            MissionType::Short => 1.0,
            MissionType::Medium => 3.0,
            MissionType::Long => 10.0,
            MissionType::Overnight => 25.0,
        }
    }

    /// Loyalty each soldier spends to go.
    pub fn loyalty_cost(&self) -> u8 {
        match self {
            MissionType::Short => 2,
            MissionType::Medium => 5,
            MissionType::Long => 10,
            MissionType::Overnight => 20,
        }
    }

    pub fn rarity_table(&self) -> &'static [(Rarity, f64)] {
        use Rarity::*;
        match self {
            MissionType::Short => &[(Common, 0.8), (Uncommon, 0.2)],
            MissionType::Medium => &[(Common, 0.6), (Uncommon, 0.3), (Rare, 0.1)],
            MissionType::Long => &[(Common, 0.4), (Uncommon, 0.4), (Rare, 0.2)],
            MissionType::Overnight => &[(Common, 0.2), (Uncommon, 0.4), (Rare, 0.3), (Epic, 0.1)],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionRewards {
    /// Granted to each soldier on the mission.
    pub exp: u64,
    pub gold: u64,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub mission_type: MissionType,
    pub soldier_ids: Vec<SoldierId>,
    pub started_at: i64,
    pub end_time: i64,
    pub rewards: MissionRewards,
}

impl Mission {
    pub fn is_due(&self, now: i64) -> bool {
        now >= self.end_time
    }

    pub fn remaining_ms(&self, now: i64) -> i64 {
        (self.end_time - now).max(0)
    }
}

/// Rewards for sending a group with combined `power`, rolled once at
/// dispatch. One loot draw per soldier.
pub fn calculate_rewards(
    power: u64,
    mission_type: MissionType,
    soldier_count: usize,
    rank: Rank,
    rng: &mut impl Rng,
) -> MissionRewards {
    let m = mission_type.reward_multiplier();
    let power = power as f64;
    let items = (0..soldier_count)
        .map(|_| {
            let rarity = roll_rarity(mission_type.rarity_table(), rng);
            generate_item(rarity, rank, rng)
        })
        .collect();

    MissionRewards {
        exp: (power * MISSION_EXP_FACTOR * m) as u64,
        gold: (power * MISSION_GOLD_FACTOR * m) as u64,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_durations() {
        assert_eq!(MissionType::Short.duration_ms(), 300_000);
        assert_eq!(MissionType::Medium.duration_ms(), 1_800_000);
        assert_eq!(MissionType::Long.duration_ms(), 7_200_000);
        assert_eq!(MissionType::Overnight.duration_ms(), 28_800_000);
    }

    #[test]
    fn test_rarity_tables_sum_to_one() {
        for mission_type in MissionType::ALL {
            let sum: f64 = mission_type.rarity_table().iter().map(|(_, c)| c).sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reward_formula() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // Two fresh common soldiers: (10 + 5) * 1 each
        let rewards = calculate_rewards(30, MissionType::Medium, 2, Rank::E, &mut rng);
        assert_eq!(rewards.exp, 9);
        assert_eq!(rewards.gold, 45);
        assert_eq!(rewards.items.len(), 2);

        let overnight = calculate_rewards(1000, MissionType::Overnight, 1, Rank::E, &mut rng);
        assert_eq!(overnight.exp, 2500);
        assert_eq!(overnight.gold, 12_500);
    }

    #[test]
    fn test_short_mission_loot_is_low_rarity() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let rewards = calculate_rewards(10, MissionType::Short, 200, Rank::E, &mut rng);
        assert!(rewards.items.iter().all(|i| i.rarity <= Rarity::Uncommon));
    }

    #[test]
    fn test_mission_due() {
        let mission = Mission {
            id: 1,
            mission_type: MissionType::Short,
            soldier_ids: vec![1],
            started_at: 0,
            end_time: 300_000,
            rewards: MissionRewards::default(),
        };
        assert!(!mission.is_due(299_999));
        assert!(mission.is_due(300_000));
        assert_eq!(mission.remaining_ms(100_000), 200_000);
        assert_eq!(mission.remaining_ms(400_000), 0);
    }
}
