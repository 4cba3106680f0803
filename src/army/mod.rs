//! Shadow army: extraction, soldiers, formations and missions.

pub mod engine;
pub mod extraction;
pub mod formation;
pub mod missions;
pub mod soldier;

pub use engine::{
    base_capacity, max_capacity, ArmyEngine, ArmySnapshot, CapacityChange, LevelUpReport,
    MissionReport,
};
pub use extraction::{
    extraction_chance, rank_bonus, soldier_type_for, Caster, EnemyDescriptor, ExtractionOutcome,
};
pub use formation::Formation;
pub use missions::{calculate_rewards, Mission, MissionId, MissionRewards, MissionType};
pub use soldier::{Evolution, Soldier, SoldierId, SoldierStats, SoldierType, Tier};
