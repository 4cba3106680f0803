//! Simulation configuration.

use crate::army::MissionType;
use crate::items::Difficulty;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of simulated sessions
    pub num_runs: u32,

    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,

    /// Simulated play time per session
    pub hours: u32,

    /// Enemies defeated per simulated minute
    pub kills_per_minute: u32,

    /// Base experience per kill, scaled by enemy tier
    pub exp_per_kill: u64,

    /// Minutes between dungeon clears (0 = never)
    pub dungeon_interval_minutes: u32,

    pub difficulty: Difficulty,

    /// Whether idle soldiers are sent on missions
    pub send_missions: bool,

    pub mission_type: MissionType,

    /// Log verbosity (0 = silent, 1 = summary, 2 = per run)
    pub verbosity: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_runs: 100,
            seed: None,
            hours: 8,
            kills_per_minute: 2,
            exp_per_kill: 20,
            dungeon_interval_minutes: 30,
            difficulty: Difficulty::Normal,
            send_missions: true,
            mission_type: MissionType::Medium,
            verbosity: 1,
        }
    }
}

impl SimConfig {
    /// Short sessions for a quick balance check.
    pub fn quick() -> Self {
        Self {
            num_runs: 20,
            hours: 2,
            ..Default::default()
        }
    }

    /// A full day of play per session.
    pub fn long_session() -> Self {
        Self {
            num_runs: 20,
            hours: 24,
            mission_type: MissionType::Long,
            ..Default::default()
        }
    }
}
