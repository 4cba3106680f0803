use super::types::{EquipmentSlot, Item};
use crate::character::stats::StatBonuses;
use serde::{Deserialize, Serialize};

/// Equipped items, one per slot.
///
/// New slots must be `#[serde(default)]` so older saves keep loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(default)]
    pub weapon: Option<Item>,
    #[serde(default)]
    pub armor: Option<Item>,
    #[serde(default)]
    pub helmet: Option<Item>,
    #[serde(default)]
    pub boots: Option<Item>,
    #[serde(default)]
    pub accessory1: Option<Item>,
    #[serde(default)]
    pub accessory2: Option<Item>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: EquipmentSlot) -> &Option<Item> {
        match slot {
            EquipmentSlot::Weapon => &self.weapon,
            EquipmentSlot::Armor => &self.armor,
            EquipmentSlot::Helmet => &self.helmet,
            EquipmentSlot::Boots => &self.boots,
            EquipmentSlot::Accessory1 => &self.accessory1,
            EquipmentSlot::Accessory2 => &self.accessory2,
        }
    }

    fn slot_mut(&mut self, slot: EquipmentSlot) -> &mut Option<Item> {
        match slot {
            EquipmentSlot::Weapon => &mut self.weapon,
            EquipmentSlot::Armor => &mut self.armor,
            EquipmentSlot::Helmet => &mut self.helmet,
            EquipmentSlot::Boots => &mut self.boots,
            EquipmentSlot::Accessory1 => &mut self.accessory1,
            EquipmentSlot::Accessory2 => &mut self.accessory2,
        }
    }

    /// Puts `item` in `slot`, returning whatever was there.
    pub fn set(&mut self, slot: EquipmentSlot, item: Option<Item>) -> Option<Item> {
        std::mem::replace(self.slot_mut(slot), item)
    }

    pub fn take(&mut self, slot: EquipmentSlot) -> Option<Item> {
        self.slot_mut(slot).take()
    }

    /// The slot an item declared for `wanted` goes into. Accessories use the
    /// first free accessory slot, or the first one when both are taken.
    pub fn resolve_slot(&self, wanted: EquipmentSlot) -> EquipmentSlot {
        if !wanted.is_accessory() {
            return wanted;
        }
        if self.accessory1.is_none() {
            EquipmentSlot::Accessory1
        } else if self.accessory2.is_none() {
            EquipmentSlot::Accessory2
        } else {
            EquipmentSlot::Accessory1
        }
    }

    pub fn iter_equipped(&self) -> impl Iterator<Item = (EquipmentSlot, &Item)> {
        EquipmentSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).as_ref().map(|item| (slot, item)))
    }

    /// Sum of the bonuses of every equipped item.
    pub fn total_bonuses(&self) -> StatBonuses {
        let mut total = StatBonuses::new();
        for (_, item) in self.iter_equipped() {
            total.add(&item.bonuses);
        }
        total
    }
}
