use crate::items::types::Item;
use serde::{Deserialize, Serialize};

/// Rewards handed between engines by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBundle {
    #[serde(default)]
    pub exp: u64,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub skill_points: u32,
}

impl RewardBundle {
    pub fn new(exp: u64, gold: u64) -> Self {
        Self {
            exp,
            gold,
            ..Default::default()
        }
    }

    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    pub fn with_skill_points(mut self, points: u32) -> Self {
        self.skill_points = points;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.exp == 0 && self.gold == 0 && self.items.is_empty() && self.skill_points == 0
    }

    pub fn merge(&mut self, other: RewardBundle) {
        self.exp = self.exp.saturating_add(other.exp);
        self.gold = self.gold.saturating_add(other.gold);
        self.items.extend(other.items);
        self.skill_points = self.skill_points.saturating_add(other.skill_points);
    }
}
