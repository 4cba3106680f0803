use crate::character::stats::StatBonuses;
use crate::core::constants::{DEFAULT_MANA_RESTORE, DEFAULT_MAX_STACK, DEFAULT_POTION_HEAL};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique id of an inventory stack.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn generate() -> Self {
        ItemId(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Helmet,
    Boots,
    Accessory1,
    Accessory2,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 6] = [
        EquipmentSlot::Weapon,
        EquipmentSlot::Armor,
        EquipmentSlot::Helmet,
        EquipmentSlot::Boots,
        EquipmentSlot::Accessory1,
        EquipmentSlot::Accessory2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EquipmentSlot::Weapon => "weapon",
            EquipmentSlot::Armor => "armor",
            EquipmentSlot::Helmet => "helmet",
            EquipmentSlot::Boots => "boots",
            EquipmentSlot::Accessory1 => "accessory1",
            EquipmentSlot::Accessory2 => "accessory2",
        }
    }

    pub fn is_accessory(&self) -> bool {
        matches!(self, EquipmentSlot::Accessory1 | EquipmentSlot::Accessory2)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Returns the display name for this rarity tier.
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }

    /// Unknown names fall back to Common.
    pub fn from_name(name: &str) -> Rarity {
        Rarity::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon,
    Armor,
    Consumable,
    Material,
}

/// What using a consumable does. Applying it is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemEffect {
    Heal(u32),
    RestoreMana(u32),
    Buff {
        bonuses: StatBonuses,
        duration_seconds: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Items with the same template and stackable flag share stacks.
    pub template: String,
    pub name: String,
    pub kind: ItemKind,
    pub rarity: Rarity,
    pub value: u64,
    #[serde(default)]
    pub slot: Option<EquipmentSlot>,
    #[serde(default)]
    pub bonuses: StatBonuses,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
    #[serde(default)]
    pub effect: Option<ItemEffect>,
}

fn default_max_stack() -> u32 {
    1
}

impl Item {
    pub fn equipment(
        name: impl Into<String>,
        kind: ItemKind,
        slot: EquipmentSlot,
        rarity: Rarity,
        bonuses: StatBonuses,
        value: u64,
    ) -> Self {
        let name = name.into();
        Self {
            template: name.to_lowercase(),
            name,
            kind,
            rarity,
            value,
            slot: Some(slot),
            bonuses,
            stackable: false,
            max_stack: 1,
            effect: None,
        }
    }

    pub fn consumable(
        template: impl Into<String>,
        name: impl Into<String>,
        rarity: Rarity,
        effect: ItemEffect,
        value: u64,
    ) -> Self {
        Self {
            template: template.into(),
            name: name.into(),
            kind: ItemKind::Consumable,
            rarity,
            value,
            slot: None,
            bonuses: StatBonuses::new(),
            stackable: true,
            max_stack: DEFAULT_MAX_STACK,
            effect: Some(effect),
        }
    }

    pub fn material(
        template: impl Into<String>,
        name: impl Into<String>,
        rarity: Rarity,
        value: u64,
    ) -> Self {
        Self {
            template: template.into(),
            name: name.into(),
            kind: ItemKind::Material,
            rarity,
            value,
            slot: None,
            bonuses: StatBonuses::new(),
            stackable: true,
            max_stack: DEFAULT_MAX_STACK,
            effect: None,
        }
    }

    pub fn health_potion() -> Self {
        Self::consumable(
            "health_potion",
            "Health Potion",
            Rarity::Common,
            ItemEffect::Heal(DEFAULT_POTION_HEAL),
            25,
        )
    }

    pub fn mana_potion() -> Self {
        Self::consumable(
            "mana_potion",
            "Mana Potion",
            Rarity::Common,
            ItemEffect::RestoreMana(DEFAULT_MANA_RESTORE),
            25,
        )
    }

    pub fn is_equippable(&self) -> bool {
        self.slot.is_some()
    }

    pub fn is_usable(&self) -> bool {
        self.effect.is_some()
    }

    /// Largest quantity a single stack of this item may hold.
    pub fn stack_limit(&self) -> u32 {
        if self.stackable {
            self.max_stack.max(1)
        } else {
            1
        }
    }

    pub fn stacks_with(&self, other: &Item) -> bool {
        self.stackable && other.stackable && self.template == other.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_ordering() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Uncommon < Rarity::Rare);
        assert!(Rarity::Rare < Rarity::Epic);
        assert!(Rarity::Epic < Rarity::Legendary);
    }

    #[test]
    fn test_rarity_from_name_falls_back_to_common() {
        assert_eq!(Rarity::from_name("epic"), Rarity::Epic);
        assert_eq!(Rarity::from_name("LEGENDARY"), Rarity::Legendary);
        assert_eq!(Rarity::from_name("mythic"), Rarity::Common);
    }

    #[test]
    fn test_stack_limit() {
        let potion = Item::health_potion();
        assert_eq!(potion.stack_limit(), 99);
        assert!(potion.is_usable());
        assert!(!potion.is_equippable());

        let sword = Item::equipment(
            "Rusty Blade",
            ItemKind::Weapon,
            EquipmentSlot::Weapon,
            Rarity::Common,
            StatBonuses::new(),
            50,
        );
        assert_eq!(sword.stack_limit(), 1);
        assert!(sword.is_equippable());
        assert!(!sword.stacks_with(&sword.clone()));
    }

    #[test]
    fn test_stacks_with_same_template_only() {
        assert!(Item::health_potion().stacks_with(&Item::health_potion()));
        assert!(!Item::health_potion().stacks_with(&Item::mana_potion()));
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let json = r#"{"template":"ore","name":"Ore","kind":"Material","rarity":"Common","value":5}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.max_stack, 1);
        assert!(!item.stackable);
        assert!(item.bonuses.is_empty());
    }

    #[test]
    fn test_item_id_serializes_as_string() {
        let id = ItemId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        assert_ne!(ItemId::generate(), ItemId::generate());
    }
}
