use serde::{Deserialize, Serialize};

/// Hunter rank, from E (weakest) to SSS.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Rank {
    #[default]
    E,
    D,
    C,
    B,
    A,
    S,
    SS,
    SSS,
}

/// Feature unlocked by reaching a rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Unlock {
    ShadowExtraction,
    ShadowArmy,
    AdvancedEvolution,
    MonarchPowers,
}

impl Unlock {
    pub fn name(&self) -> &'static str {
        match self {
            Unlock::ShadowExtraction => "Shadow Extraction",
            Unlock::ShadowArmy => "Shadow Army",
            Unlock::AdvancedEvolution => "Advanced Evolution",
            Unlock::MonarchPowers => "Monarch Powers",
        }
    }
}

impl Rank {
    pub const ALL: [Rank; 8] = [
        Rank::E,
        Rank::D,
        Rank::C,
        Rank::B,
        Rank::A,
        Rank::S,
        Rank::SS,
        Rank::SSS,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rank::E => "E",
            Rank::D => "D",
            Rank::C => "C",
            Rank::B => "B",
            Rank::A => "A",
            Rank::S => "S",
            Rank::SS => "SS",
            Rank::SSS => "SSS",
        }
    }

    /// Parses a rank name. Unknown names fall back to the lowest rank.
    pub fn from_name(name: &str) -> Rank {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<Rank> {
        Rank::ALL.get(self.index() + 1).copied()
    }

    /// Minimum character level for this rank.
    pub fn level_threshold(&self) -> u32 {
        match self {
            Rank::E => 1,
            Rank::D => 10,
            Rank::C => 25,
            Rank::B => 40,
            Rank::A => 60,
            Rank::S => 80,
            Rank::SS => 100,
            Rank::SSS => 120,
        }
    }

    /// Combat and extraction multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            Rank::E => 1.0,
            Rank::D => 1.5,
            Rank::C => 2.0,
            Rank::B => 3.0,
            Rank::A => 5.0,
            Rank::S => 8.0,
            Rank::SS => 12.0,
            Rank::SSS => 20.0,
        }
    }

    /// The feature this rank unlocks when first reached, if any.
    pub fn unlock(&self) -> Option<Unlock> {
        match self {
            Rank::D => Some(Unlock::ShadowExtraction),
            Rank::B => Some(Unlock::ShadowArmy),
            Rank::A => Some(Unlock::AdvancedEvolution),
            Rank::S => Some(Unlock::MonarchPowers),
            _ => None,
        }
    }

    /// Highest rank whose threshold is at or below `level`.
    pub fn for_level(level: u32) -> Rank {
        Rank::ALL
            .into_iter()
            .rev()
            .find(|rank| level >= rank.level_threshold())
            .unwrap_or_default()
    }

    /// Ranks strictly above `self` up to and including `target`, in order.
    pub fn path_to(&self, target: Rank) -> impl Iterator<Item = Rank> {
        let from = self.index() + 1;
        let to = target.index();
        Rank::ALL
            .into_iter()
            .enumerate()
            .filter(move |(i, _)| *i >= from && *i <= to)
            .map(|(_, rank)| rank)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
