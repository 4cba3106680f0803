use super::drops::{rarity_chances, roll_rarity, Difficulty};
use super::types::{EquipmentSlot, Item, ItemEffect, ItemKind, Rarity};
use crate::character::rank::Rank;
use crate::character::stats::{StatBonuses, StatType};
use crate::core::constants::DEFAULT_POTION_HEAL;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Stats a generated item can roll bonuses in.
const BONUS_STATS: [StatType; 5] = [
    StatType::Strength,
    StatType::Agility,
    StatType::Endurance,
    StatType::Intelligence,
    StatType::Perception,
];

/// Slots armor-type drops can land in (weapons always go to the weapon slot).
const ARMOR_SLOTS: [EquipmentSlot; 4] = [
    EquipmentSlot::Armor,
    EquipmentSlot::Helmet,
    EquipmentSlot::Boots,
    EquipmentSlot::Accessory1,
];

/// Gold and items for clearing a dungeon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonReward {
    pub gold: u64,
    pub items: Vec<Item>,
}

/// Sell value of an item.
pub fn item_value(rarity: Rarity, rank: Rank) -> u64 {
    let base = match rarity {
        Rarity::Common => 50.0,
        Rarity::Uncommon => 150.0,
        Rarity::Rare => 500.0,
        Rarity::Epic => 1500.0,
        Rarity::Legendary => 5000.0,
    };
    let rank_multiplier = match rank {
        Rank::E => 1.0,
        Rank::D => 1.5,
        Rank::C => 2.5,
        Rank::B => 4.0,
        Rank::A => 6.0,
        Rank::S => 9.0,
        Rank::SS => 13.0,
        Rank::SSS => 18.0,
    };
    (base * rank_multiplier) as u64
}

/// Inclusive range of a single bonus roll.
pub fn bonus_range(rarity: Rarity) -> (u32, u32) {
    match rarity {
        Rarity::Common => (1, 3),
        Rarity::Uncommon => (2, 5),
        Rarity::Rare => (3, 8),
        Rarity::Epic => (5, 12),
        Rarity::Legendary => (8, 20),
    }
}

fn bonus_count(rarity: Rarity) -> usize {
    match rarity {
        Rarity::Common | Rarity::Uncommon => 1,
        Rarity::Rare => 2,
        Rarity::Epic => 3,
        Rarity::Legendary => 4,
    }
}

pub fn roll_bonus_value(rarity: Rarity, rng: &mut impl Rng) -> u32 {
    let (min, max) = bonus_range(rarity);
    rng.gen_range(min..=max)
}

/// Random stat bonuses plus the slot's signature bonus.
pub fn generate_item_bonuses(
    rarity: Rarity,
    slot: EquipmentSlot,
    rng: &mut impl Rng,
) -> StatBonuses {
    let mut bonuses = StatBonuses::new();

    for _ in 0..bonus_count(rarity) {
        let stat = BONUS_STATS[rng.gen_range(0..BONUS_STATS.len())];
        let value = roll_bonus_value(rarity, rng);
        bonuses.stats.increase(stat, value);
    }

    match slot {
        EquipmentSlot::Weapon => bonuses.damage = roll_bonus_value(rarity, rng) * 2,
        EquipmentSlot::Armor => bonuses.defense = roll_bonus_value(rarity, rng) * 2,
        EquipmentSlot::Helmet => bonuses.health = roll_bonus_value(rarity, rng) * 10,
        EquipmentSlot::Boots => {
            let value = roll_bonus_value(rarity, rng);
            bonuses.stats.increase(StatType::Agility, value);
        }
        EquipmentSlot::Accessory1 | EquipmentSlot::Accessory2 => {}
    }

    bonuses
}

fn slot_noun(slot: EquipmentSlot) -> &'static str {
    match slot {
        EquipmentSlot::Weapon => "Blade",
        EquipmentSlot::Armor => "Armor",
        EquipmentSlot::Helmet => "Helm",
        EquipmentSlot::Boots => "Boots",
        EquipmentSlot::Accessory1 | EquipmentSlot::Accessory2 => "Ring",
    }
}

/// An item of a fixed rarity, valued for a dungeon of `rank`.
pub fn generate_item(rarity: Rarity, rank: Rank, rng: &mut impl Rng) -> Item {
    let value = item_value(rarity, rank);

    match rng.gen_range(0..4) {
        0 | 1 => {
            let (kind, slot) = if rng.gen_bool(0.5) {
                (ItemKind::Weapon, EquipmentSlot::Weapon)
            } else {
                (
                    ItemKind::Armor,
                    ARMOR_SLOTS[rng.gen_range(0..ARMOR_SLOTS.len())],
                )
            };
            let bonuses = generate_item_bonuses(rarity, slot, rng);
            let name = format!("{} {}", rarity.name(), slot_noun(slot));
            Item::equipment(name, kind, slot, rarity, bonuses, value)
        }
        2 => {
            let heal = DEFAULT_POTION_HEAL * (rarity.index() as u32 + 1);
            Item::consumable(
                format!("potion_{}", rarity.name().to_lowercase()),
                format!("{} Potion", rarity.name()),
                rarity,
                ItemEffect::Heal(heal),
                value,
            )
        }
        _ => Item::material(
            format!("essence_{}", rarity.name().to_lowercase()),
            format!("{} Essence", rarity.name()),
            rarity,
            value,
        ),
    }
}

/// A random drop for a dungeon of `rank` at `difficulty`.
pub fn generate_random_item(rank: Rank, difficulty: Difficulty, rng: &mut impl Rng) -> Item {
    let rarity = roll_rarity(&rarity_chances(rank, difficulty), rng);
    generate_item(rarity, rank, rng)
}

pub fn dungeon_gold(rank: Rank, difficulty: Difficulty) -> u64 {
    let base = match rank {
        Rank::E => 100.0,
        Rank::D => 250.0,
        Rank::C => 500.0,
        Rank::B => 1000.0,
        Rank::A => 2500.0,
        Rank::S => 5000.0,
        Rank::SS => 10000.0,
        Rank::SSS => 25000.0,
    };
    (base * difficulty.gold_multiplier()) as u64
}

pub fn generate_dungeon_reward(
    rank: Rank,
    difficulty: Difficulty,
    rng: &mut impl Rng,
) -> DungeonReward {
    let item_count = 1 + difficulty.index() / 2;
    DungeonReward {
        gold: dungeon_gold(rank, difficulty),
        items: (0..item_count)
            .map(|_| generate_random_item(rank, difficulty, rng))
            .collect(),
    }
}
