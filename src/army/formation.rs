use serde::{Deserialize, Serialize};

/// Army stance, scaling damage and defense in `army_power`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formation {
    #[default]
    Default,
    Offensive,
    Defensive,
    Balanced,
}

impl Formation {
    pub const ALL: [Formation; 4] = [
        Formation::Default,
        Formation::Offensive,
        Formation::Defensive,
        Formation::Balanced,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Formation::Default => "default",
            Formation::Offensive => "offensive",
            Formation::Defensive => "defensive",
            Formation::Balanced => "balanced",
        }
    }

    /// Unknown names fall back to Default.
    pub fn from_name(name: &str) -> Formation {
        Formation::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn damage_multiplier(&self) -> f64 {
        match self {
            Formation::Default => 1.0,
            Formation::Offensive => 1.3,
            Formation::Defensive => 0.8,
            Formation::Balanced => 1.1,
        }
    }

    pub fn defense_multiplier(&self) -> f64 {
        match self {
            Formation::Default => 1.0,
            Formation::Offensive => 0.8,
            Formation::Defensive => 1.5,
            Formation::Balanced => 1.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formation_multipliers() {
        assert_eq!(Formation::default(), Formation::Default);
        assert!(Formation::Offensive.damage_multiplier() > Formation::Offensive.defense_multiplier());
        assert!(Formation::Defensive.defense_multiplier() > Formation::Defensive.damage_multiplier());
        assert_eq!(Formation::from_name("Balanced"), Formation::Balanced);
        assert_eq!(Formation::from_name("turtle"), Formation::Default);
    }
}
