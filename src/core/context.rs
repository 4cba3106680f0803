//! The application context: one instance of every engine plus the timer
//! queue, RNG and persistence gateway.
//!
//! Engines never call each other. Every cross-engine effect (rewards, unlocks,
//! capacity, equipment overlay) is routed here, by value, and each touched
//! engine is saved after the command. A failed save is logged and the
//! in-memory change stands.

use crate::army::{
    ArmyEngine, ArmySnapshot, CapacityChange, Caster, EnemyDescriptor, ExtractionOutcome,
    Formation, LevelUpReport, Mission, MissionId, MissionReport, MissionType, SoldierId,
};
use crate::character::{
    ExpGainReport, ProgressionEngine, ProgressionSnapshot, Rank, StatAllocation, StatType,
};
use crate::core::config::GameConfig;
use crate::core::constants::{
    ARMY_SAVE_KEY, INVENTORY_SAVE_KEY, MS_PER_HOUR, PROGRESSION_SAVE_KEY, QUESTS_SAVE_KEY,
};
use crate::core::error::{GameError, GameResult, PersistenceError};
use crate::core::rewards::RewardBundle;
use crate::core::scheduler::{TimerAction, TimerQueue};
use crate::items::{
    generate_dungeon_reward, Difficulty, EquipOutcome, EquipmentSlot, InventoryEngine,
    InventorySnapshot, Item, ItemEffect, ItemId, ItemStack, RewardReceipt, UnequipOutcome,
};
use crate::persistence::{
    FileStore, LoadWarning, PersistenceGateway, Persistent, SaveExport, SaveInfo, Storage,
};
use crate::quests::{
    AchievementInputs, AchievementUnlock, ObjectiveKind, Quest, QuestCompletion, QuestEngine,
    QuestSnapshot,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// Current wall-clock time as Unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineKey {
    Progression,
    Army,
    Inventory,
    Quests,
}

const ALL_ENGINES: [EngineKey; 4] = [
    EngineKey::Progression,
    EngineKey::Army,
    EngineKey::Inventory,
    EngineKey::Quests,
];

const SAVE_KEYS: [&str; 4] = [
    PROGRESSION_SAVE_KEY,
    ARMY_SAVE_KEY,
    INVENTORY_SAVE_KEY,
    QUESTS_SAVE_KEY,
];

/// Where one reward bundle went.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RewardOutcome {
    pub exp: ExpGainReport,
    pub gold: u64,
    pub receipt: RewardReceipt,
    pub skill_points: u32,
}

/// Quests finished and achievements unlocked by one event, all already paid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressReport {
    pub quests_completed: Vec<QuestCompletion>,
    pub achievements: Vec<AchievementUnlock>,
}

impl ProgressReport {
    pub fn is_empty(&self) -> bool {
        self.quests_completed.is_empty() && self.achievements.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DefeatReport {
    /// `None` when extraction is locked or the army is full.
    pub extraction: Option<ExtractionOutcome>,
    pub progress: ProgressReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DungeonClearReport {
    pub gold: u64,
    pub receipt: RewardReceipt,
    pub progress: ProgressReport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub missions: Vec<MissionReport>,
    pub expired_quests: Vec<String>,
    pub daily_reset: bool,
    pub loyalty_restored: usize,
    pub progress: ProgressReport,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
            && self.expired_quests.is_empty()
            && !self.daily_reset
            && self.loyalty_restored == 0
            && self.progress.is_empty()
    }
}

/// Read-only view of the whole game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub progression: ProgressionSnapshot,
    pub army: ArmySnapshot,
    pub inventory: InventorySnapshot,
    pub quests: QuestSnapshot,
    pub next_timer: Option<i64>,
}

pub struct GameContextBuilder {
    config: GameConfig,
    storage: Option<Box<dyn Storage>>,
    seed: Option<u64>,
}

impl GameContextBuilder {
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            storage: None,
            seed: None,
        }
    }

    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn storage(mut self, storage: Box<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Uses a `FileStore` in the configured save directory.
    pub fn file_storage(mut self) -> GameResult<Self> {
        let dir = self
            .config
            .resolve_save_dir()
            .map_err(PersistenceError::from)?;
        let store = FileStore::at(dir).map_err(PersistenceError::from)?;
        self.storage = Some(Box::new(store));
        Ok(self)
    }

    /// Overrides the configured RNG seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self, now: i64) -> GameResult<GameContext> {
        let storage = self.storage.ok_or(GameError::MissingDependency("storage"))?;
        let mut config = self.config;
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
        GameContext::load(storage, config, now)
    }
}

impl Default for GameContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct GameContext {
    config: GameConfig,
    progression: ProgressionEngine,
    army: ArmyEngine,
    inventory: InventoryEngine,
    quests: QuestEngine,
    timers: TimerQueue,
    rng: StdRng,
    gateway: PersistenceGateway,
    load_warnings: Vec<LoadWarning>,
}

impl GameContext {
    pub fn builder() -> GameContextBuilder {
        GameContextBuilder::new()
    }

    /// Restores every engine from `storage` (fresh state for missing keys),
    /// repairs cross-engine invariants, and runs every timer already due.
    ///
    /// An unreadable key never blocks the others: it is moved aside and
    /// replaced by its newest readable backup or fresh state, and reported
    /// through [`GameContext::load_warnings`].
    pub fn load(storage: Box<dyn Storage>, config: GameConfig, now: i64) -> GameResult<Self> {
        let mut gateway = PersistenceGateway::new(storage);
        let mut load_warnings = Vec::new();
        let progression = recover::<ProgressionEngine>(&mut gateway, &mut load_warnings)
            .unwrap_or_default();
        let army = recover::<ArmyEngine>(&mut gateway, &mut load_warnings).unwrap_or_default();
        let inventory = recover::<InventoryEngine>(&mut gateway, &mut load_warnings)
            .unwrap_or_else(|| InventoryEngine::with_capacity(config.inventory_capacity));
        let quests = recover::<QuestEngine>(&mut gateway, &mut load_warnings).unwrap_or_default();
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut ctx = Self {
            config,
            progression,
            army,
            inventory,
            quests,
            timers: TimerQueue::new(),
            rng,
            gateway,
            load_warnings,
        };
        let report = ctx.reconcile(now);
        tracing::info!(
            level = ctx.progression.level(),
            rank = %ctx.progression.rank(),
            soldiers = ctx.army.soldier_count(),
            missions_settled = report.missions.len(),
            recovered = ctx.load_warnings.len(),
            "game loaded"
        );
        Ok(ctx)
    }

    /// Brings the loaded engines back in line with each other, rebuilds
    /// the timer queue, and drains whatever is due.
    fn reconcile(&mut self, now: i64) -> TickReport {
        for unlock in self.progression.normalize() {
            self.army.apply_unlock(unlock);
        }
        self.army.normalize();
        self.refresh_capacity();
        self.progression
            .set_equipment_overlay(self.inventory.equipment_bonuses());
        self.quests.set_daily_count(self.config.daily_quest_count);
        self.quests.normalize();

        self.timers.clear();
        let missions: Vec<(i64, MissionId)> =
            self.army.missions().map(|m| (m.end_time, m.id)).collect();
        for (end_time, id) in missions {
            self.timers.schedule(end_time, TimerAction::CompleteMission(id));
        }
        self.timers
            .schedule(self.quests.next_reset_at(), TimerAction::DailyReset);
        if let Some(expiry) = self.quests.next_expiry() {
            self.timers.schedule(expiry, TimerAction::QuestExpiry);
        }
        self.timers.schedule(now, TimerAction::LoyaltyRegen);

        let report = self.tick(now);
        // Failures are already logged per engine.
        let _ = self.save_all(now);
        report
    }

    /// Runs every timer due at `now`.
    pub fn tick(&mut self, now: i64) -> TickReport {
        let mut report = TickReport::default();
        let mut touched: Vec<EngineKey> = Vec::new();

        while let Some(timer) = self.timers.pop_due(now) {
            match timer.action {
                TimerAction::CompleteMission(id) => {
                    if let Some(mission) = self.army.complete_mission(id) {
                        self.inventory.add_gold(mission.gold);
                        self.inventory.receive_items(mission.items.clone());
                        touched.extend([EngineKey::Army, EngineKey::Inventory]);
                        report.missions.push(mission);
                    }
                }
                TimerAction::DailyReset => {
                    if self.quests.check_daily_reset(now, &mut self.rng) {
                        report.daily_reset = true;
                        touched.push(EngineKey::Quests);
                    }
                    self.timers
                        .schedule(self.quests.next_reset_at(), TimerAction::DailyReset);
                }
                TimerAction::QuestExpiry => {
                    let expired = self.quests.expire_quests(now);
                    if !expired.is_empty() {
                        touched.push(EngineKey::Quests);
                        report.expired_quests.extend(expired);
                    }
                    if let Some(expiry) = self.quests.next_expiry() {
                        self.timers.schedule(expiry, TimerAction::QuestExpiry);
                    }
                }
                TimerAction::LoyaltyRegen => {
                    let restored = self.army.regen_loyalty(now);
                    if restored > 0 {
                        report.loyalty_restored += restored;
                        touched.push(EngineKey::Army);
                    }
                    self.timers
                        .schedule(now + MS_PER_HOUR, TimerAction::LoyaltyRegen);
                }
            }
        }

        if !report.missions.is_empty() {
            report.progress = self.settle(Vec::new(), now);
            if !report.progress.is_empty() {
                touched.extend(ALL_ENGINES);
            }
        }
        self.persist(&touched, now);
        report
    }

    // =========================================================================
    // Progression
    // =========================================================================

    pub fn gain_exp(&mut self, amount: u64, now: i64) -> ExpGainReport {
        let report = self.apply_exp(amount);
        self.persist(&[EngineKey::Progression, EngineKey::Army], now);
        report
    }

    pub fn allocate_stat(
        &mut self,
        stat: StatType,
        points: u32,
        now: i64,
    ) -> GameResult<StatAllocation> {
        let allocation = self.progression.allocate_stat(stat, points)?;
        if stat == StatType::Charisma {
            self.refresh_capacity();
            self.persist(&[EngineKey::Progression, EngineKey::Army], now);
        } else {
            self.persist(&[EngineKey::Progression], now);
        }
        Ok(allocation)
    }

    fn apply_exp(&mut self, amount: u64) -> ExpGainReport {
        let report = self.progression.gain_exp(amount);
        for unlock in &report.unlocks {
            self.army.apply_unlock(*unlock);
            tracing::info!(unlock = unlock.name(), "feature unlocked");
        }
        if report.rank_change.is_some() {
            self.refresh_capacity();
        }
        report
    }

    fn refresh_capacity(&mut self) -> CapacityChange {
        self.army
            .update_capacity(self.progression.rank(), self.progression.charisma())
    }

    fn caster(&self) -> Caster {
        Caster {
            rank: self.progression.rank(),
            charisma: self.progression.charisma(),
        }
    }

    // =========================================================================
    // Army
    // =========================================================================

    /// Explicit extraction attempt. Requires the extraction unlock.
    pub fn extract_soldier(
        &mut self,
        enemy: &EnemyDescriptor,
        now: i64,
    ) -> GameResult<ExtractionOutcome> {
        if !self.army.is_extraction_unlocked() {
            return Err(GameError::InvalidState(
                "shadow extraction is not unlocked".to_string(),
            ));
        }
        let caster = self.caster();
        let outcome = self.army.extract_soldier(enemy, caster, now, &mut self.rng)?;
        if outcome.soldier_id().is_some() {
            let completions = self
                .quests
                .record_progress(ObjectiveKind::Extract, &enemy.kind, 1, now);
            self.settle(completions, now);
            self.persist(&ALL_ENGINES, now);
        }
        Ok(outcome)
    }

    pub fn level_up_soldier(&mut self, id: SoldierId, now: i64) -> GameResult<LevelUpReport> {
        let report = self.army.level_up_soldier(id)?;
        self.persist(&[EngineKey::Army], now);
        Ok(report)
    }

    pub fn send_on_mission(
        &mut self,
        ids: &[SoldierId],
        mission_type: MissionType,
        now: i64,
    ) -> GameResult<Mission> {
        let mission = self
            .army
            .send_on_mission(ids, mission_type, now, &mut self.rng)?;
        self.timers
            .schedule(mission.end_time, TimerAction::CompleteMission(mission.id));
        self.persist(&[EngineKey::Army], now);
        Ok(mission)
    }

    pub fn cancel_mission(&mut self, id: MissionId, now: i64) -> GameResult<Vec<SoldierId>> {
        let freed = self.army.cancel_mission(id, now)?;
        self.persist(&[EngineKey::Army], now);
        Ok(freed)
    }

    /// Releases a soldier and banks the refund. Returns the new gold total.
    pub fn dismiss_soldier(&mut self, id: SoldierId, now: i64) -> GameResult<u64> {
        let refund = self.army.dismiss_soldier(id)?;
        let gold = self.inventory.add_gold(refund);
        self.persist(&[EngineKey::Army, EngineKey::Inventory], now);
        Ok(gold)
    }

    pub fn set_formation(&mut self, formation: Formation, now: i64) {
        self.army.set_formation(formation);
        self.persist(&[EngineKey::Army], now);
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub fn add_item(&mut self, item: Item, quantity: u32, now: i64) -> GameResult<Vec<ItemId>> {
        let ids = self.inventory.add_item(item, quantity)?;
        self.persist(&[EngineKey::Inventory], now);
        Ok(ids)
    }

    pub fn remove_item(&mut self, id: &ItemId, quantity: u32, now: i64) -> GameResult<ItemStack> {
        let removed = self.inventory.remove_item(id, quantity)?;
        self.persist(&[EngineKey::Inventory], now);
        Ok(removed)
    }

    /// Equips an item and refreshes the progression overlay. Charisma from
    /// gear can change army capacity.
    pub fn equip_item(&mut self, id: &ItemId, now: i64) -> GameResult<EquipOutcome> {
        let outcome = self.inventory.equip_item(id)?;
        self.progression.set_equipment_overlay(outcome.bonuses);
        self.refresh_capacity();
        self.persist(
            &[EngineKey::Progression, EngineKey::Army, EngineKey::Inventory],
            now,
        );
        Ok(outcome)
    }

    pub fn unequip_item(&mut self, slot: EquipmentSlot, now: i64) -> GameResult<UnequipOutcome> {
        let outcome = self.inventory.unequip_item(slot)?;
        self.progression.set_equipment_overlay(outcome.bonuses);
        self.refresh_capacity();
        self.persist(
            &[EngineKey::Progression, EngineKey::Army, EngineKey::Inventory],
            now,
        );
        Ok(outcome)
    }

    /// Consumes one item. The effect is returned for the combat layer.
    pub fn use_item(&mut self, id: &ItemId, now: i64) -> GameResult<ItemEffect> {
        let effect = self.inventory.use_item(id)?;
        self.persist(&[EngineKey::Inventory], now);
        Ok(effect)
    }

    pub fn add_gold(&mut self, amount: u64, now: i64) -> u64 {
        let gold = self.inventory.add_gold(amount);
        self.settle(Vec::new(), now);
        self.persist(&ALL_ENGINES, now);
        gold
    }

    pub fn spend_gold(&mut self, amount: u64, now: i64) -> GameResult<u64> {
        let gold = self.inventory.spend_gold(amount)?;
        self.persist(&[EngineKey::Inventory], now);
        Ok(gold)
    }

    pub fn claim_overflow(&mut self, now: i64) -> usize {
        let claimed = self.inventory.claim_overflow();
        if claimed > 0 {
            self.persist(&[EngineKey::Inventory], now);
        }
        claimed
    }

    // =========================================================================
    // Quests
    // =========================================================================

    pub fn add_quest(&mut self, quest: Quest, now: i64) -> GameResult<()> {
        self.quests.add_quest(quest, now)?;
        self.schedule_quest_expiry();
        self.persist(&[EngineKey::Quests], now);
        Ok(())
    }

    pub fn start_daily(&mut self, id: &str, now: i64) -> GameResult<()> {
        self.quests.start_daily(id, now)?;
        self.schedule_quest_expiry();
        self.persist(&[EngineKey::Quests], now);
        Ok(())
    }

    /// Advances one objective; a finished quest pays out immediately.
    pub fn update_quest_objective(
        &mut self,
        id: &str,
        index: usize,
        amount: u32,
        now: i64,
    ) -> GameResult<ProgressReport> {
        let completion = self.quests.update_quest_objective(id, index, amount, now)?;
        let report = self.settle(completion.into_iter().collect(), now);
        self.persist(&ALL_ENGINES, now);
        Ok(report)
    }

    pub fn complete_quest(&mut self, id: &str, now: i64) -> GameResult<ProgressReport> {
        let completion = self.quests.complete_quest(id, now)?;
        let report = self.settle(vec![completion], now);
        self.persist(&ALL_ENGINES, now);
        Ok(report)
    }

    pub fn fail_quest(&mut self, id: &str, now: i64) -> GameResult<()> {
        self.quests.fail_quest(id, now)?;
        self.persist(&[EngineKey::Quests], now);
        Ok(())
    }

    fn schedule_quest_expiry(&mut self) {
        if let Some(expiry) = self.quests.next_expiry() {
            self.timers.schedule(expiry, TimerAction::QuestExpiry);
        }
    }

    // =========================================================================
    // Rewards and inbound triggers
    // =========================================================================

    /// Pays a reward bundle into progression and inventory.
    pub fn apply_rewards(&mut self, rewards: RewardBundle, now: i64) -> RewardOutcome {
        let outcome = self.grant(rewards);
        self.settle(Vec::new(), now);
        self.persist(&ALL_ENGINES, now);
        outcome
    }

    fn grant(&mut self, rewards: RewardBundle) -> RewardOutcome {
        let exp = self.apply_exp(rewards.exp);
        if rewards.gold > 0 {
            self.inventory.add_gold(rewards.gold);
        }
        let receipt = self.inventory.receive_items(rewards.items);
        if rewards.skill_points > 0 {
            self.progression.grant_skill_points(rewards.skill_points);
        }
        RewardOutcome {
            exp,
            gold: rewards.gold,
            receipt,
            skill_points: rewards.skill_points,
        }
    }

    fn achievement_inputs(&self) -> AchievementInputs {
        AchievementInputs {
            level: self.progression.level(),
            rank: self.progression.rank(),
            soldier_count: self.army.soldier_count(),
            gold: self.inventory.gold(),
        }
    }

    /// Pays finished quests, then unlocks achievements until none are left
    /// (achievement rewards can earn further achievements).
    fn settle(&mut self, completions: Vec<QuestCompletion>, now: i64) -> ProgressReport {
        let mut report = ProgressReport::default();
        for completion in completions {
            self.grant(completion.rewards.clone());
            report.quests_completed.push(completion);
        }
        loop {
            let inputs = self.achievement_inputs();
            let unlocks = self.quests.check_achievements(&inputs, now);
            if unlocks.is_empty() {
                break;
            }
            for unlock in &unlocks {
                self.grant(unlock.rewards.clone());
            }
            report.achievements.extend(unlocks);
        }
        report
    }

    /// A fight was won: counts the kill for quests and achievements and, if
    /// extraction is unlocked and the army has room, tries to extract.
    pub fn on_enemy_defeated(&mut self, enemy: &EnemyDescriptor, now: i64) -> DefeatReport {
        self.quests.on_enemy_killed();
        let mut completions = self
            .quests
            .record_progress(ObjectiveKind::Kill, &enemy.kind, 1, now);

        let extraction = if !self.army.is_extraction_unlocked() {
            None
        } else if self.army.is_full() {
            tracing::debug!(enemy = %enemy.kind, "army full, extraction skipped");
            None
        } else {
            let caster = self.caster();
            match self.army.extract_soldier(enemy, caster, now, &mut self.rng) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::debug!(error = %e, "extraction skipped");
                    None
                }
            }
        };
        if extraction.as_ref().and_then(|o| o.soldier_id()).is_some() {
            completions.extend(
                self.quests
                    .record_progress(ObjectiveKind::Extract, &enemy.kind, 1, now),
            );
        }

        let progress = self.settle(completions, now);
        self.persist(&ALL_ENGINES, now);
        DefeatReport {
            extraction,
            progress,
        }
    }

    /// Loot picked up in the field. Counts toward collect objectives.
    pub fn on_item_reward(
        &mut self,
        item: Item,
        quantity: u32,
        now: i64,
    ) -> GameResult<ProgressReport> {
        let target = item.template.clone();
        self.inventory.add_item(item, quantity)?;
        let completions =
            self.quests
                .record_progress(ObjectiveKind::Collect, &target, quantity, now);
        let report = self.settle(completions, now);
        self.persist(&ALL_ENGINES, now);
        Ok(report)
    }

    /// A dungeon was cleared: rolls and pays its reward, then counts the
    /// clear for quests and achievements.
    pub fn on_dungeon_cleared(
        &mut self,
        rank: Rank,
        difficulty: Difficulty,
        now: i64,
    ) -> DungeonClearReport {
        let reward = generate_dungeon_reward(rank, difficulty, &mut self.rng);
        self.inventory.add_gold(reward.gold);
        let receipt = self.inventory.receive_items(reward.items);

        self.quests.on_dungeon_cleared();
        let completions = self.quests.record_progress(
            ObjectiveKind::CompleteDungeon,
            difficulty.name(),
            1,
            now,
        );
        let progress = self.settle(completions, now);
        self.persist(&ALL_ENGINES, now);
        tracing::info!(rank = %rank, difficulty = difficulty.name(), gold = reward.gold, "dungeon cleared");
        DungeonClearReport {
            gold: reward.gold,
            receipt,
            progress,
        }
    }

    /// An item was upgraded by the enhancement collaborator.
    pub fn on_equipment_upgraded(&mut self, template: &str, now: i64) -> ProgressReport {
        let completions = self
            .quests
            .record_progress(ObjectiveKind::Upgrade, template, 1, now);
        let report = self.settle(completions, now);
        self.persist(&ALL_ENGINES, now);
        report
    }

    // =========================================================================
    // Views and persistence
    // =========================================================================

    pub fn progression(&self) -> &ProgressionEngine {
        &self.progression
    }

    pub fn army(&self) -> &ArmyEngine {
        &self.army
    }

    pub fn inventory(&self) -> &InventoryEngine {
        &self.inventory
    }

    pub fn quests(&self) -> &QuestEngine {
        &self.quests
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn next_timer(&self) -> Option<i64> {
        self.timers.next_deadline()
    }

    /// Keys that could not be read at load time and how each was recovered.
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.load_warnings
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            progression: self.progression.snapshot(),
            army: self.army.snapshot(),
            inventory: self.inventory.snapshot(),
            quests: self.quests.snapshot(),
            next_timer: self.timers.next_deadline(),
        }
    }

    /// Writes every engine. Returns the first failure after attempting all.
    pub fn save_all(&mut self, now: i64) -> GameResult<()> {
        let mut first_error = None;
        for key in ALL_ENGINES {
            if let Err(e) = self.save_engine(key, now) {
                tracing::warn!(error = %e, engine = ?key, "save failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Version and save time of every stored engine.
    pub fn save_info(&self) -> GameResult<Vec<SaveInfo>> {
        let mut infos = Vec::with_capacity(SAVE_KEYS.len());
        for key in SAVE_KEYS {
            infos.extend(self.gateway.info(key)?);
        }
        Ok(infos)
    }

    /// The current in-memory state of every engine as one document.
    pub fn export_save(&self, now: i64) -> GameResult<SaveExport> {
        let mut export = SaveExport::new(now);
        export.insert(&self.progression, now)?;
        export.insert(&self.army, now)?;
        export.insert(&self.inventory, now)?;
        export.insert(&self.quests, now)?;
        Ok(export)
    }

    /// Replaces the whole game with an exported one. Every engine in the
    /// document is decoded before anything changes, so a bad document leaves
    /// the current game untouched. Engines missing from it start fresh.
    pub fn import_save(&mut self, export: &SaveExport, now: i64) -> GameResult<TickReport> {
        export.validate()?;
        let progression = export.decode::<ProgressionEngine>()?.unwrap_or_default();
        let army = export.decode::<ArmyEngine>()?.unwrap_or_default();
        let inventory = export
            .decode::<InventoryEngine>()?
            .unwrap_or_else(|| InventoryEngine::with_capacity(self.config.inventory_capacity));
        let quests = export.decode::<QuestEngine>()?.unwrap_or_default();

        self.progression = progression;
        self.army = army;
        self.inventory = inventory;
        self.quests = quests;
        self.load_warnings.clear();
        tracing::info!(exported_at = export.exported_at, "save imported");
        Ok(self.reconcile(now))
    }

    /// Deletes every stored engine and starts a new game in place.
    pub fn delete_save(&mut self, now: i64) -> GameResult<()> {
        for key in SAVE_KEYS {
            self.gateway.delete(key)?;
        }
        self.progression = ProgressionEngine::default();
        self.army = ArmyEngine::default();
        self.inventory = InventoryEngine::with_capacity(self.config.inventory_capacity);
        self.quests = QuestEngine::default();
        self.load_warnings.clear();
        tracing::info!("save deleted");
        self.reconcile(now);
        Ok(())
    }

    fn save_engine(&mut self, key: EngineKey, now: i64) -> Result<(), PersistenceError> {
        match key {
            EngineKey::Progression => save(&mut self.gateway, &self.progression, now),
            EngineKey::Army => save(&mut self.gateway, &self.army, now),
            EngineKey::Inventory => save(&mut self.gateway, &self.inventory, now),
            EngineKey::Quests => save(&mut self.gateway, &self.quests, now),
        }
    }

    /// Saves each listed engine once. Failures are logged, never returned.
    fn persist(&mut self, keys: &[EngineKey], now: i64) {
        let mut saved: Vec<EngineKey> = Vec::with_capacity(keys.len());
        for &key in keys {
            if saved.contains(&key) {
                continue;
            }
            saved.push(key);
            if let Err(e) = self.save_engine(key, now) {
                tracing::warn!(error = %e, engine = ?key, "save failed, keeping in-memory state");
            }
        }
    }
}

fn recover<E: Persistent>(
    gateway: &mut PersistenceGateway,
    warnings: &mut Vec<LoadWarning>,
) -> Option<E> {
    let (engine, warning) = gateway.load_engine_or_recover::<E>();
    warnings.extend(warning);
    engine
}

fn save<E: Persistent>(
    gateway: &mut PersistenceGateway,
    engine: &E,
    now: i64,
) -> Result<(), PersistenceError> {
    gateway.save_engine(engine, now)
}
