//! Bag, equipment and gold ledger.

use super::equipment::Equipment;
use super::types::{EquipmentSlot, Item, ItemEffect, ItemId, Rarity};
use crate::character::stats::StatBonuses;
use crate::core::constants::{DEFAULT_INVENTORY_CAPACITY, INVENTORY_SAVE_KEY};
use crate::core::error::{GameError, GameResult};
use crate::persistence::Persistent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: Item,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipOutcome {
    pub slot: EquipmentSlot,
    /// Item that was in the slot before and went back to the bag.
    pub replaced: Option<ItemId>,
    pub bonuses: StatBonuses,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnequipOutcome {
    pub item_id: ItemId,
    pub bonuses: StatBonuses,
}

/// Where reward items ended up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewardReceipt {
    pub stored: usize,
    pub overflowed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackView {
    pub id: ItemId,
    pub name: String,
    pub rarity: Rarity,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySnapshot {
    pub gold: u64,
    pub capacity: usize,
    pub stacks: Vec<StackView>,
    pub equipped: Vec<(EquipmentSlot, String)>,
    pub overflow: usize,
    pub bonuses: StatBonuses,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEngine {
    items: BTreeMap<ItemId, ItemStack>,
    #[serde(default)]
    equipment: Equipment,
    #[serde(default)]
    gold: u64,
    #[serde(default = "default_capacity")]
    capacity: usize,
    #[serde(default)]
    overflow: Vec<ItemStack>,
}

fn default_capacity() -> usize {
    DEFAULT_INVENTORY_CAPACITY
}

impl Default for InventoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryEngine {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INVENTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            equipment: Equipment::new(),
            gold: 0,
            capacity,
            overflow: Vec::new(),
        }
    }

    pub fn gold(&self) -> u64 {
        self.gold
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stack_count(&self) -> usize {
        self.items.len()
    }

    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.items.len())
    }

    pub fn get(&self, id: &ItemId) -> Option<&ItemStack> {
        self.items.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = (&ItemId, &ItemStack)> {
        self.items.iter()
    }

    pub fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    pub fn overflow(&self) -> &[ItemStack] {
        &self.overflow
    }

    /// Total quantity held of items with this template.
    pub fn count_template(&self, template: &str) -> u32 {
        self.items
            .values()
            .filter(|stack| stack.item.template == template)
            .map(|stack| stack.quantity)
            .sum()
    }

    /// First stack holding an item with this template.
    pub fn find_template(&self, template: &str) -> Option<ItemId> {
        self.items
            .iter()
            .find(|(_, stack)| stack.item.template == template)
            .map(|(id, _)| id.clone())
    }

    pub fn expand_capacity(&mut self, extra: usize) {
        self.capacity = self.capacity.saturating_add(extra);
    }

    /// Adds `quantity` of `item`, topping up existing stacks first.
    ///
    /// Fails with `InventoryFull`, changing nothing, when the remainder needs
    /// more new stacks than there are free slots. Returns the ids of every
    /// stack that received items.
    pub fn add_item(&mut self, item: Item, quantity: u32) -> GameResult<Vec<ItemId>> {
        if quantity == 0 {
            return Err(GameError::InvalidState(
                "cannot add zero items".to_string(),
            ));
        }

        let limit = item.stack_limit();
        let absorbable: u64 = self
            .items
            .values()
            .filter(|stack| stack.item.stacks_with(&item))
            .map(|stack| limit.saturating_sub(stack.quantity) as u64)
            .sum();
        let remainder = (quantity as u64).saturating_sub(absorbable);
        let new_stacks = remainder.div_ceil(limit as u64) as usize;

        if new_stacks > self.free_slots() {
            return Err(GameError::InventoryFull {
                capacity: self.capacity,
            });
        }

        let mut touched = Vec::new();
        let mut left = quantity;

        if item.stackable {
            for (id, stack) in self.items.iter_mut() {
                if left == 0 {
                    break;
                }
                if !stack.item.stacks_with(&item) {
                    continue;
                }
                let moved = limit.saturating_sub(stack.quantity).min(left);
                if moved > 0 {
                    stack.quantity += moved;
                    left -= moved;
                    touched.push(id.clone());
                }
            }
        }

        while left > 0 {
            let moved = limit.min(left);
            let id = ItemId::generate();
            self.items.insert(
                id.clone(),
                ItemStack {
                    item: item.clone(),
                    quantity: moved,
                },
            );
            left -= moved;
            touched.push(id);
        }

        if item.rarity >= Rarity::Epic {
            tracing::info!(item = %item.name, rarity = item.rarity.name(), "rare item obtained");
        }

        Ok(touched)
    }

    /// Removes `quantity` from a stack, dropping the stack when it empties.
    pub fn remove_item(&mut self, id: &ItemId, quantity: u32) -> GameResult<ItemStack> {
        if quantity == 0 {
            return Err(GameError::InvalidState(
                "cannot remove zero items".to_string(),
            ));
        }
        let stack = self
            .items
            .get_mut(id)
            .ok_or_else(|| GameError::not_found("item", id))?;

        if stack.quantity < quantity {
            return Err(GameError::InsufficientQuantity {
                id: id.to_string(),
                available: stack.quantity,
                requested: quantity,
            });
        }

        stack.quantity -= quantity;
        let item = stack.item.clone();
        if stack.quantity == 0 {
            self.items.remove(id);
        }

        Ok(ItemStack { item, quantity })
    }

    /// Moves one item from the bag into its slot. The previous occupant, if
    /// any, goes back to the bag.
    pub fn equip_item(&mut self, id: &ItemId) -> GameResult<EquipOutcome> {
        let stack = self
            .items
            .get(id)
            .ok_or_else(|| GameError::not_found("item", id))?;
        let wanted = stack.item.slot.ok_or_else(|| {
            GameError::InvalidState(format!("{} cannot be equipped", stack.item.name))
        })?;

        let slot = self.equipment.resolve_slot(wanted);
        let frees_stack = stack.quantity == 1;
        if self.equipment.get(slot).is_some() && !frees_stack && self.free_slots() == 0 {
            return Err(GameError::InventoryFull {
                capacity: self.capacity,
            });
        }

        let taken = self.remove_item(id, 1)?;
        let replaced = match self.equipment.set(slot, Some(taken.item)) {
            Some(previous) => Some(self.insert_new_stack(previous)),
            None => None,
        };

        tracing::debug!(slot = slot.name(), "equipped item");
        Ok(EquipOutcome {
            slot,
            replaced,
            bonuses: self.equipment_bonuses(),
        })
    }

    /// Moves the item in `slot` back to the bag.
    pub fn unequip_item(&mut self, slot: EquipmentSlot) -> GameResult<UnequipOutcome> {
        if self.equipment.get(slot).is_none() {
            return Err(GameError::not_found("equipped item", slot.name()));
        }
        if self.free_slots() == 0 {
            return Err(GameError::InventoryFull {
                capacity: self.capacity,
            });
        }

        let item = self
            .equipment
            .take(slot)
            .ok_or_else(|| GameError::not_found("equipped item", slot.name()))?;
        let item_id = self.insert_new_stack(item);

        Ok(UnequipOutcome {
            item_id,
            bonuses: self.equipment_bonuses(),
        })
    }

    fn insert_new_stack(&mut self, item: Item) -> ItemId {
        let id = ItemId::generate();
        self.items.insert(id.clone(), ItemStack { item, quantity: 1 });
        id
    }

    pub fn equipment_bonuses(&self) -> StatBonuses {
        self.equipment.total_bonuses()
    }

    /// Consumes one usable item and returns its effect.
    pub fn use_item(&mut self, id: &ItemId) -> GameResult<ItemEffect> {
        let stack = self
            .items
            .get(id)
            .ok_or_else(|| GameError::not_found("item", id))?;
        let effect = stack.item.effect.clone().ok_or_else(|| {
            GameError::InvalidState(format!("{} cannot be used", stack.item.name))
        })?;

        self.remove_item(id, 1)?;
        Ok(effect)
    }

    pub fn add_gold(&mut self, amount: u64) -> u64 {
        self.gold = self.gold.saturating_add(amount);
        self.gold
    }

    pub fn spend_gold(&mut self, amount: u64) -> GameResult<u64> {
        if self.gold < amount {
            return Err(GameError::InsufficientGold {
                available: self.gold,
                requested: amount,
            });
        }
        self.gold -= amount;
        Ok(self.gold)
    }

    /// Stores reward items, parking whatever does not fit in the overflow.
    pub fn receive_items(&mut self, items: Vec<Item>) -> RewardReceipt {
        let mut receipt = RewardReceipt::default();
        for item in items {
            match self.add_item(item.clone(), 1) {
                Ok(_) => receipt.stored += 1,
                Err(_) => {
                    self.overflow.push(ItemStack { item, quantity: 1 });
                    receipt.overflowed += 1;
                }
            }
        }
        if receipt.overflowed > 0 {
            tracing::warn!(count = receipt.overflowed, "inventory full, rewards held in overflow");
        }
        receipt
    }

    /// Moves as much of the overflow into the bag as fits. Returns how many
    /// overflow entries were claimed.
    pub fn claim_overflow(&mut self) -> usize {
        let pending = std::mem::take(&mut self.overflow);
        let mut claimed = 0;
        for stack in pending {
            if self.add_item(stack.item.clone(), stack.quantity).is_ok() {
                claimed += 1;
            } else {
                self.overflow.push(stack);
            }
        }
        claimed
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            gold: self.gold,
            capacity: self.capacity,
            stacks: self
                .items
                .iter()
                .map(|(id, stack)| StackView {
                    id: id.clone(),
                    name: stack.item.name.clone(),
                    rarity: stack.item.rarity,
                    quantity: stack.quantity,
                })
                .collect(),
            equipped: self
                .equipment
                .iter_equipped()
                .map(|(slot, item)| (slot, item.name.clone()))
                .collect(),
            overflow: self.overflow.len(),
            bonuses: self.equipment_bonuses(),
        }
    }
}

impl Persistent for InventoryEngine {
    const SAVE_KEY: &'static str = INVENTORY_SAVE_KEY;
}
