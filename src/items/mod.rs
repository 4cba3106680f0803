//! Item system: types, equipment, loot, and the inventory ledger.

pub mod drops;
pub mod equipment;
pub mod generation;
pub mod inventory;
pub mod types;

pub use drops::{base_rarity_table, rarity_chances, roll_rarity, Difficulty};
pub use equipment::Equipment;
pub use generation::{
    dungeon_gold, generate_dungeon_reward, generate_item, generate_random_item, item_value,
    DungeonReward,
};
pub use inventory::{
    EquipOutcome, InventoryEngine, InventorySnapshot, ItemStack, RewardReceipt, StackView,
    UnequipOutcome,
};
pub use types::{EquipmentSlot, Item, ItemEffect, ItemId, ItemKind, Rarity};
