use super::achievements::{AchievementId, AchievementInputs, AchievementUnlock, Achievements};
use super::daily::{generate_daily_batch, next_daily_reset};
use super::types::{ObjectiveKind, Quest, QuestCompletion, QuestKind, QuestStatus};
use crate::core::constants::{DAILY_QUEST_COUNT, QUESTS_SAVE_KEY};
use crate::core::error::{GameError, GameResult};
use crate::persistence::Persistent;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestSnapshot {
    pub active: Vec<Quest>,
    pub daily: Vec<Quest>,
    pub completed: usize,
    pub failed: usize,
    pub next_reset_at: i64,
    pub total_kills: u64,
    pub dungeons_cleared: u64,
    pub achievements: Vec<AchievementId>,
}

/// Quest log: active quests in start order, finished quests by id, the
/// offered daily batch and the achievement tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestEngine {
    #[serde(default)]
    active: Vec<Quest>,
    #[serde(default)]
    completed: BTreeMap<String, Quest>,
    #[serde(default)]
    failed: BTreeMap<String, Quest>,
    /// Today's offered dailies, not yet started.
    #[serde(default)]
    daily: Vec<Quest>,
    /// 0 until the first batch is generated.
    #[serde(default)]
    next_reset_at: i64,
    #[serde(default = "default_daily_count")]
    daily_count: usize,
    #[serde(default)]
    achievements: Achievements,
}

fn default_daily_count() -> usize {
    DAILY_QUEST_COUNT
}

impl Default for QuestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestEngine {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            completed: BTreeMap::new(),
            failed: BTreeMap::new(),
            daily: Vec::new(),
            next_reset_at: 0,
            daily_count: DAILY_QUEST_COUNT,
            achievements: Achievements::default(),
        }
    }

    pub fn with_daily_count(mut self, count: usize) -> Self {
        self.daily_count = count;
        self
    }

    pub fn set_daily_count(&mut self, count: usize) {
        self.daily_count = count;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn active_quests(&self) -> &[Quest] {
        &self.active
    }

    pub fn daily_quests(&self) -> &[Quest] {
        &self.daily
    }

    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.active
            .iter()
            .chain(self.daily.iter())
            .find(|q| q.id == id)
            .or_else(|| self.completed.get(id))
            .or_else(|| self.failed.get(id))
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.contains_key(id)
    }

    pub fn is_failed(&self, id: &str) -> bool {
        self.failed.contains_key(id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn next_reset_at(&self) -> i64 {
        self.next_reset_at
    }

    pub fn achievements(&self) -> &Achievements {
        &self.achievements
    }

    /// Earliest expiry among active quests.
    pub fn next_expiry(&self) -> Option<i64> {
        self.active.iter().filter_map(|q| q.expires_at).min()
    }

    fn is_known(&self, id: &str) -> bool {
        self.active.iter().any(|q| q.id == id)
            || self.completed.contains_key(id)
            || self.failed.contains_key(id)
    }

    fn active_index(&self, id: &str) -> GameResult<usize> {
        if self.completed.contains_key(id) || self.failed.contains_key(id) {
            return Err(GameError::InvalidState(format!(
                "quest {} is already finished",
                id
            )));
        }
        self.active
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| GameError::not_found("quest", id))
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn add_quest(&mut self, mut quest: Quest, now: i64) -> GameResult<()> {
        if self.is_known(&quest.id) {
            return Err(GameError::InvalidState(format!(
                "quest {} was already started",
                quest.id
            )));
        }
        if quest.objectives.is_empty() {
            return Err(GameError::InvalidState(format!(
                "quest {} has no objectives",
                quest.id
            )));
        }
        quest.start(now);
        tracing::info!(id = %quest.id, title = %quest.title, "quest started");
        self.active.push(quest);
        Ok(())
    }

    /// Adds progress to one objective. Returns the completion when this
    /// finished the last open objective.
    pub fn update_quest_objective(
        &mut self,
        id: &str,
        index: usize,
        amount: u32,
        now: i64,
    ) -> GameResult<Option<QuestCompletion>> {
        let pos = self.active_index(id)?;
        let quest = &mut self.active[pos];
        let objective = quest
            .objectives
            .get_mut(index)
            .ok_or_else(|| GameError::not_found("objective", index))?;
        if objective.completed {
            return Err(GameError::InvalidState(format!(
                "objective {} of quest {} is already complete",
                index, id
            )));
        }
        objective.advance(amount);

        if quest.is_complete() {
            return self.complete_quest(id, now).map(Some);
        }
        Ok(None)
    }

    /// Advances every matching objective on every active quest.
    pub fn record_progress(
        &mut self,
        kind: ObjectiveKind,
        target: &str,
        amount: u32,
        now: i64,
    ) -> Vec<QuestCompletion> {
        let mut finished = Vec::new();
        for quest in &mut self.active {
            let mut touched = false;
            for objective in quest
                .objectives
                .iter_mut()
                .filter(|o| !o.completed && o.matches(kind, target))
            {
                objective.advance(amount);
                touched = true;
            }
            if touched && quest.is_complete() {
                finished.push(quest.id.clone());
            }
        }

        finished
            .into_iter()
            .filter_map(|id| self.complete_quest(&id, now).ok())
            .collect()
    }

    /// Moves an active quest to completed and hands out its rewards.
    /// Completing it again is an `InvalidState` error, so rewards pay once.
    pub fn complete_quest(&mut self, id: &str, now: i64) -> GameResult<QuestCompletion> {
        let pos = self.active_index(id)?;
        let mut quest = self.active.remove(pos);
        quest.status = QuestStatus::Completed;
        quest.finished_at = Some(now);

        let completion = QuestCompletion {
            quest_id: quest.id.clone(),
            title: quest.title.clone(),
            rewards: quest.rewards.clone(),
        };
        tracing::info!(id = %quest.id, "quest completed");
        self.completed.insert(quest.id.clone(), quest);
        Ok(completion)
    }

    pub fn fail_quest(&mut self, id: &str, now: i64) -> GameResult<()> {
        let pos = self.active_index(id)?;
        let mut quest = self.active.remove(pos);
        quest.status = QuestStatus::Failed;
        quest.finished_at = Some(now);
        tracing::info!(id = %quest.id, "quest failed");
        self.failed.insert(quest.id.clone(), quest);
        Ok(())
    }

    /// Fails every active quest whose deadline has passed.
    pub fn expire_quests(&mut self, now: i64) -> Vec<String> {
        let expired: Vec<String> = self
            .active
            .iter()
            .filter(|q| q.is_expired(now))
            .map(|q| q.id.clone())
            .collect();
        for id in &expired {
            // Ids come from `active`, so this cannot miss.
            let _ = self.fail_quest(id, now);
        }
        expired
    }

    /// Replaces the offered dailies once `now` reaches the reset time.
    /// Returns true when a new batch was generated.
    pub fn check_daily_reset(&mut self, now: i64, rng: &mut impl Rng) -> bool {
        if now < self.next_reset_at {
            return false;
        }
        let reset_at = next_daily_reset(now);
        self.daily = generate_daily_batch(self.daily_count, reset_at, rng);
        self.next_reset_at = reset_at;
        tracing::info!(count = self.daily.len(), next_reset_at = reset_at, "daily quests refreshed");
        true
    }

    pub fn start_daily(&mut self, id: &str, now: i64) -> GameResult<()> {
        let pos = self
            .daily
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| GameError::not_found("daily quest", id))?;
        if self.daily[pos].is_expired(now) {
            return Err(GameError::InvalidState(format!("daily quest {} has expired", id)));
        }
        let quest = self.daily.remove(pos);
        self.add_quest(quest, now)
    }

    // =========================================================================
    // Achievements
    // =========================================================================

    pub fn on_enemy_killed(&mut self) {
        self.achievements.on_enemy_killed();
    }

    pub fn on_dungeon_cleared(&mut self) {
        self.achievements.on_dungeon_cleared();
    }

    pub fn check_achievements(
        &mut self,
        inputs: &AchievementInputs,
        now: i64,
    ) -> Vec<AchievementUnlock> {
        let unlocks = self.achievements.check(inputs, now);
        for unlock in &unlocks {
            tracing::info!(achievement = unlock.name, "achievement unlocked");
        }
        unlocks
    }

    /// Repairs loaded state: offered dailies must still be available and
    /// active quests must be marked active. Returns the number of fixes.
    pub fn normalize(&mut self) -> usize {
        let before = self.daily.len();
        self.daily
            .retain(|q| q.kind == QuestKind::Daily && q.status == QuestStatus::Available);
        let mut touched = before - self.daily.len();
        for quest in &mut self.active {
            if quest.status != QuestStatus::Active {
                quest.status = QuestStatus::Active;
                touched += 1;
            }
            for objective in quest.objectives.iter_mut().filter(|o| o.required == 0) {
                objective.required = 1;
                touched += 1;
            }
        }
        touched
    }

    pub fn snapshot(&self) -> QuestSnapshot {
        QuestSnapshot {
            active: self.active.clone(),
            daily: self.daily.clone(),
            completed: self.completed.len(),
            failed: self.failed.len(),
            next_reset_at: self.next_reset_at,
            total_kills: self.achievements.total_kills,
            dungeons_cleared: self.achievements.dungeons_cleared,
            achievements: self.achievements.unlocked_ids(),
        }
    }
}

impl Persistent for QuestEngine {
    const SAVE_KEY: &'static str = QUESTS_SAVE_KEY;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::rewards::RewardBundle;
    use crate::quests::types::{Objective, ANY_TARGET};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hunt_quest(id: &str, required: u32) -> Quest {
        Quest::new(id, "Hunt", "Kill things", QuestKind::Side)
            .with_objective(Objective::new(ObjectiveKind::Kill, ANY_TARGET, required))
            .with_rewards(RewardBundle::new(100, 50))
    }

    #[test]
    fn test_add_quest_rejects_duplicates() {
        let mut engine = QuestEngine::new();
        engine.add_quest(hunt_quest("q1", 2), 0).unwrap();
        let err = engine.add_quest(hunt_quest("q1", 2), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        engine.complete_quest("q1", 2).unwrap();
        let err = engine.add_quest(hunt_quest("q1", 2), 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_add_quest_needs_objectives() {
        let mut engine = QuestEngine::new();
        let empty = Quest::new("empty", "Nothing", "", QuestKind::Side);
        let err = engine.add_quest(empty, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(engine.quest("empty").is_none());
    }

    #[test]
    fn test_zero_required_objective_still_completes() {
        let quest: Quest = serde_json::from_value(serde_json::json!({
            "id": "raw",
            "title": "Raw",
            "description": "",
            "kind": "Side",
            "objectives": [{"kind": "Kill", "target": ANY_TARGET, "required": 0}],
            "status": "Available",
        }))
        .unwrap();

        let mut engine = QuestEngine::new();
        engine.add_quest(quest, 0).unwrap();
        assert_eq!(engine.quest("raw").unwrap().objectives[0].required, 1);

        let done = engine.record_progress(ObjectiveKind::Kill, "wolf", 1, 5);
        assert_eq!(done.len(), 1);
        assert!(engine.is_completed("raw"));
    }

    #[test]
    fn test_objective_update_autocompletes() {
        let mut engine = QuestEngine::new();
        engine.add_quest(hunt_quest("q1", 3), 0).unwrap();

        assert_eq!(engine.update_quest_objective("q1", 0, 2, 1).unwrap(), None);
        let done = engine.update_quest_objective("q1", 0, 5, 2).unwrap().unwrap();
        assert_eq!(done.quest_id, "q1");
        assert_eq!(done.rewards.exp, 100);
        assert!(engine.is_completed("q1"));
        assert!(engine.active_quests().is_empty());

        let stored = engine.quest("q1").unwrap();
        assert_eq!(stored.objectives[0].current, 3);
        assert_eq!(stored.status, QuestStatus::Completed);
    }

    #[test]
    fn test_rewards_paid_once() {
        let mut engine = QuestEngine::new();
        engine.add_quest(hunt_quest("q1", 3), 0).unwrap();
        assert!(engine.complete_quest("q1", 1).is_ok());
        let err = engine.complete_quest("q1", 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(engine.fail_quest("q1", 2).unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_unknown_quest_and_objective() {
        let mut engine = QuestEngine::new();
        assert_eq!(
            engine.update_quest_objective("nope", 0, 1, 0).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        engine.add_quest(hunt_quest("q1", 3), 0).unwrap();
        assert_eq!(
            engine.update_quest_objective("q1", 4, 1, 0).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_record_progress_matches_targets() {
        let mut engine = QuestEngine::new();
        engine.add_quest(hunt_quest("any", 2), 0).unwrap();
        engine
            .add_quest(
                Quest::new("goblins", "Goblins", "", QuestKind::Side)
                    .with_objective(Objective::new(ObjectiveKind::Kill, "goblin", 1)),
                0,
            )
            .unwrap();

        let done = engine.record_progress(ObjectiveKind::Kill, "orc", 1, 10);
        assert!(done.is_empty());
        assert_eq!(engine.quest("any").unwrap().objectives[0].current, 1);
        assert_eq!(engine.quest("goblins").unwrap().objectives[0].current, 0);

        let done = engine.record_progress(ObjectiveKind::Kill, "goblin", 1, 11);
        let ids: Vec<&str> = done.iter().map(|c| c.quest_id.as_str()).collect();
        assert_eq!(ids, vec!["any", "goblins"]);
    }

    #[test]
    fn test_expire_quests() {
        let mut engine = QuestEngine::new();
        engine.add_quest(hunt_quest("timed", 5).with_time_limit(1_000), 0).unwrap();
        engine.add_quest(hunt_quest("open", 5), 0).unwrap();
        assert_eq!(engine.next_expiry(), Some(1_000));

        assert!(engine.expire_quests(999).is_empty());
        assert_eq!(engine.expire_quests(1_000), vec!["timed".to_string()]);
        assert!(engine.is_failed("timed"));
        assert_eq!(engine.active_quests().len(), 1);
        assert_eq!(engine.next_expiry(), None);
    }

    #[test]
    fn test_daily_reset_is_idempotent_within_a_day() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut engine = QuestEngine::new();
        let now = 1_700_000_000_000;

        assert!(engine.check_daily_reset(now, &mut rng));
        let batch: Vec<String> = engine.daily_quests().iter().map(|q| q.id.clone()).collect();
        assert_eq!(batch.len(), DAILY_QUEST_COUNT);

        assert!(!engine.check_daily_reset(now + 1, &mut rng));
        let again: Vec<String> = engine.daily_quests().iter().map(|q| q.id.clone()).collect();
        assert_eq!(batch, again);

        let reset = engine.next_reset_at();
        assert!(engine.check_daily_reset(reset, &mut rng));
        assert!(engine.next_reset_at() > reset);
    }

    #[test]
    fn test_start_daily_activates() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut engine = QuestEngine::new();
        engine.check_daily_reset(0, &mut rng);
        let id = engine.daily_quests()[0].id.clone();

        engine.start_daily(&id, 10).unwrap();
        assert_eq!(engine.daily_quests().len(), DAILY_QUEST_COUNT - 1);
        assert_eq!(engine.active_quests()[0].id, id);
        assert_eq!(
            engine.start_daily(&id, 11).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_achievement_counters_feed_checks() {
        let mut engine = QuestEngine::new();
        engine.on_enemy_killed();
        let inputs = AchievementInputs {
            level: 1,
            rank: crate::character::Rank::E,
            soldier_count: 0,
            gold: 0,
        };
        assert_eq!(engine.check_achievements(&inputs, 0).len(), 1);
        assert!(engine.check_achievements(&inputs, 1).is_empty());
        assert_eq!(engine.snapshot().total_kills, 1);
    }

    #[test]
    fn test_round_trips_through_json() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut engine = QuestEngine::new();
        engine.check_daily_reset(0, &mut rng);
        engine.add_quest(hunt_quest("q1", 3), 0).unwrap();
        engine.record_progress(ObjectiveKind::Kill, "wolf", 1, 1);

        let json = serde_json::to_value(&engine).unwrap();
        let restored: QuestEngine = serde_json::from_value(json).unwrap();
        assert_eq!(restored, engine);
    }
}
