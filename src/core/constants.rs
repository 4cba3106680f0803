// Timing
pub const MS_PER_SECOND: i64 = 1_000;
pub const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
pub const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

// Experience and leveling
pub const STARTING_LEVEL: u32 = 1;
pub const STARTING_EXP_TO_NEXT: u64 = 100;
pub const LEVEL_UP_STAT_POINTS: u32 = 5;

// Character stats
pub const BASE_STAT_VALUE: u32 = 10;
pub const NUM_STATS: usize = 6;

// Derived stat formulas (per point above BASE_STAT_VALUE)
pub const BASE_MAX_HEALTH: u32 = 100;
pub const BASE_MAX_MANA: u32 = 50;
pub const BASE_DAMAGE: f64 = 10.0;
pub const DAMAGE_PER_STRENGTH: f64 = 1.1;
pub const ATTACK_SPEED_PER_AGILITY: f64 = 0.05;
pub const HEALTH_PER_ENDURANCE: u32 = 10;
pub const MANA_PER_INTELLIGENCE: u32 = 5;
pub const CHARISMA_PER_CAPACITY_SLOT: u32 = 10;
/// Cooldowns never drop below this fraction of their base duration.
pub const MIN_COOLDOWN_FACTOR: f64 = 0.25;

// Extraction
pub const EXTRACTION_BASE_RATE: f64 = 0.3;
pub const EXTRACTION_CHARISMA_FACTOR: f64 = 0.01;
pub const EXTRACTION_MAX_RATE: f64 = 0.95;

// Soldier base stats (before tier multiplier)
pub const SOLDIER_BASE_HEALTH: u32 = 50;
pub const SOLDIER_BASE_DAMAGE: u32 = 10;
pub const SOLDIER_BASE_DEFENSE: u32 = 5;
pub const SOLDIER_BASE_SPEED: f64 = 1.0;

// Soldier progression
pub const SOLDIER_EXP_PER_LEVEL: u64 = 100;
pub const SOLDIER_EVOLUTION_LEVELS: [u32; 5] = [10, 20, 30, 40, 50];
pub const SOLDIER_EVOLUTION_MULTIPLIER: f64 = 1.5;
pub const SOLDIER_DISMISS_REFUND_PER_LEVEL: u64 = 10;

// Loyalty
pub const MAX_LOYALTY: u8 = 100;
pub const LOYALTY_REGEN_PER_HOUR: u8 = 5;

// Mission rewards
pub const MISSION_EXP_FACTOR: f64 = 0.1;
pub const MISSION_GOLD_FACTOR: f64 = 0.5;

// Inventory
pub const DEFAULT_INVENTORY_CAPACITY: usize = 50;
pub const DEFAULT_MAX_STACK: u32 = 99;
pub const DEFAULT_POTION_HEAL: u32 = 50;
pub const DEFAULT_MANA_RESTORE: u32 = 30;
pub const DEFAULT_BUFF_DURATION_SECONDS: u32 = 300;

// Quests
pub const DAILY_QUEST_COUNT: usize = 3;

// Achievements
pub const DUNGEON_MASTER_CLEARS: u64 = 10;
pub const SHADOW_COLLECTOR_SOLDIERS: usize = 20;
pub const WEALTHY_GOLD: u64 = 100_000;
pub const MAX_LEVEL_ACHIEVEMENT: u32 = 100;

// Persistence
pub const SAVE_FORMAT_VERSION: u32 = 1;
pub const PROGRESSION_SAVE_KEY: &str = "progression";
pub const ARMY_SAVE_KEY: &str = "army";
pub const INVENTORY_SAVE_KEY: &str = "inventory";
pub const QUESTS_SAVE_KEY: &str = "quests";
pub const CONFIG_FILE_NAME: &str = "config.json";
/// Older copies kept per key by `FileStore`.
pub const SAVE_BACKUP_COUNT: usize = 5;
pub const SAVE_EXPORT_FORMAT: &str = "shadow-monarch-save";

// Simulation
pub const SIM_SECONDS_PER_STEP: i64 = 60;
