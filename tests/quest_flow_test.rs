//! Integration test: quests, dailies and achievements driven through
//! GameContext events and timers.

use shadow_monarch::army::{EnemyDescriptor, Tier};
use shadow_monarch::character::Rank;
use shadow_monarch::core::constants::MS_PER_MINUTE;
use shadow_monarch::core::{ErrorKind, GameContext, RewardBundle};
use shadow_monarch::items::{Difficulty, Item};
use shadow_monarch::persistence::MemoryStore;
use shadow_monarch::quests::{AchievementId, Objective, ObjectiveKind, Quest, QuestKind, ANY_TARGET};

const START: i64 = 1_700_000_000_000;

fn context() -> GameContext {
    GameContext::builder()
        .storage(Box::new(MemoryStore::new()))
        .seed(21)
        .build(START)
        .unwrap()
}

fn hunt(id: &str, target: &str, count: u32) -> Quest {
    Quest::new(id, "Hunt", "Thin the herd", QuestKind::Side)
        .with_objective(Objective::new(ObjectiveKind::Kill, target, count))
        .with_rewards(RewardBundle::new(200, 300))
}

#[test]
fn test_hunt_quest_pays_once_on_last_kill() {
    let mut ctx = context();
    ctx.add_quest(hunt("goblins", "goblin", 3), START).unwrap();
    let goblin = EnemyDescriptor::new("goblin", Tier::Common);

    // The first kill also earns FirstKill.
    let first = ctx.on_enemy_defeated(&goblin, START);
    assert!(first.progress.quests_completed.is_empty());
    assert_eq!(first.progress.achievements.len(), 1);
    assert_eq!(first.progress.achievements[0].id, AchievementId::FirstKill);
    let gold_after_first = ctx.inventory().gold();

    // Other kinds do not count.
    ctx.on_enemy_defeated(&EnemyDescriptor::new("orc", Tier::Common), START);
    assert_eq!(ctx.quests().quest("goblins").unwrap().objectives[0].current, 1);

    ctx.on_enemy_defeated(&goblin, START);
    let last = ctx.on_enemy_defeated(&goblin, START);
    assert_eq!(last.progress.quests_completed.len(), 1);
    assert_eq!(last.progress.quests_completed[0].quest_id, "goblins");
    assert_eq!(ctx.inventory().gold(), gold_after_first + 300);
    assert!(ctx.quests().is_completed("goblins"));

    let after = ctx.on_enemy_defeated(&goblin, START);
    assert!(after.progress.is_empty());
    assert_eq!(ctx.inventory().gold(), gold_after_first + 300);

    let err = ctx.complete_quest("goblins", START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_duplicate_quest_id_rejected() {
    let mut ctx = context();
    ctx.add_quest(hunt("q", ANY_TARGET, 5), START).unwrap();
    let err = ctx.add_quest(hunt("q", ANY_TARGET, 5), START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_quest_without_objectives_rejected() {
    let mut ctx = context();
    let empty = Quest::new("idle", "Wait", "Nothing to do", QuestKind::Side)
        .with_rewards(RewardBundle::new(1_000, 1_000));
    let err = ctx.add_quest(empty, START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(ctx.quests().quest("idle").is_none());
    assert_eq!(ctx.inventory().gold(), 0);
}

#[test]
fn test_manual_objective_updates() {
    let mut ctx = context();
    let quest = Quest::new("story-1", "Awakening", "Clear the gate", QuestKind::Story)
        .with_objective(Objective::new(ObjectiveKind::Kill, ANY_TARGET, 2))
        .with_objective(Objective::new(ObjectiveKind::CompleteDungeon, ANY_TARGET, 1))
        .with_rewards(RewardBundle::new(0, 50).with_skill_points(2));
    ctx.add_quest(quest, START).unwrap();

    let report = ctx.update_quest_objective("story-1", 0, 5, START).unwrap();
    assert!(report.quests_completed.is_empty());
    assert_eq!(ctx.quests().quest("story-1").unwrap().objectives[0].current, 2);

    let err = ctx.update_quest_objective("story-1", 0, 1, START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = ctx.update_quest_objective("story-1", 7, 1, START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let points_before = ctx.progression().available_points();
    let report = ctx.update_quest_objective("story-1", 1, 1, START).unwrap();
    assert_eq!(report.quests_completed.len(), 1);
    assert_eq!(ctx.progression().available_points(), points_before + 2);
    assert_eq!(ctx.inventory().gold(), 50);

    let err = ctx.update_quest_objective("missing", 0, 1, START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_collect_dungeon_and_upgrade_events() {
    let mut ctx = context();
    let quest = Quest::new("mixed", "Preparation", "", QuestKind::Side)
        .with_objective(Objective::new(ObjectiveKind::Collect, "health_potion", 5))
        .with_objective(Objective::new(
            ObjectiveKind::CompleteDungeon,
            Difficulty::Hard.name(),
            1,
        ))
        .with_objective(Objective::new(ObjectiveKind::Upgrade, "knight killer", 1))
        .with_rewards(RewardBundle::new(10, 10));
    ctx.add_quest(quest, START).unwrap();

    ctx.on_item_reward(Item::health_potion(), 3, START).unwrap();
    ctx.on_item_reward(Item::health_potion(), 3, START).unwrap();
    ctx.on_dungeon_cleared(Rank::E, Difficulty::Normal, START);
    assert!(!ctx.quests().quest("mixed").unwrap().objectives[1].completed);
    ctx.on_dungeon_cleared(Rank::E, Difficulty::Hard, START);

    let objectives = &ctx.quests().quest("mixed").unwrap().objectives;
    assert_eq!(objectives[0].current, 5);
    assert!(objectives[1].completed);
    assert!(!objectives[2].completed);

    let report = ctx.on_equipment_upgraded("knight killer", START);
    assert_eq!(report.quests_completed.len(), 1);
    assert!(ctx.quests().is_completed("mixed"));
}

#[test]
fn test_time_limited_quest_expires_on_tick() {
    let mut ctx = context();
    let quest = hunt("timed", ANY_TARGET, 10).with_time_limit(10 * MS_PER_MINUTE);
    ctx.add_quest(quest, START).unwrap();
    assert_eq!(
        ctx.quests().quest("timed").unwrap().expires_at,
        Some(START + 10 * MS_PER_MINUTE)
    );

    let early = ctx.tick(START + 10 * MS_PER_MINUTE - 1);
    assert!(early.expired_quests.is_empty());

    let report = ctx.tick(START + 10 * MS_PER_MINUTE);
    assert_eq!(report.expired_quests, vec!["timed".to_string()]);
    assert!(ctx.quests().is_failed("timed"));

    // A failed quest ignores later kills.
    let defeat = ctx.on_enemy_defeated(&EnemyDescriptor::new("wolf", Tier::Common), START);
    assert!(defeat.progress.quests_completed.is_empty());
    let err = ctx.update_quest_objective("timed", 0, 1, START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_daily_reset_is_idempotent() {
    let mut ctx = context();
    let first: Vec<String> = ctx.quests().daily_quests().iter().map(|q| q.id.clone()).collect();
    assert_eq!(first.len(), 3);
    let reset_at = ctx.quests().next_reset_at();
    assert!(reset_at > START);

    let report = ctx.tick(reset_at - 1);
    assert!(!report.daily_reset);

    let report = ctx.tick(reset_at);
    assert!(report.daily_reset);
    let second: Vec<String> = ctx.quests().daily_quests().iter().map(|q| q.id.clone()).collect();
    assert_eq!(second.len(), 3);
    assert!(second.iter().all(|id| !first.contains(id)));
    assert!(ctx.quests().next_reset_at() > reset_at);

    let report = ctx.tick(reset_at);
    assert!(!report.daily_reset);
    let third: Vec<String> = ctx.quests().daily_quests().iter().map(|q| q.id.clone()).collect();
    assert_eq!(third, second);
}

#[test]
fn test_start_daily_moves_it_to_active() {
    let mut ctx = context();
    let id = ctx.quests().daily_quests()[0].id.clone();

    ctx.start_daily(&id, START + 1).unwrap();
    assert_eq!(ctx.quests().daily_quests().len(), 2);
    assert!(ctx.quests().active_quests().iter().any(|q| q.id == id));

    let err = ctx.start_daily(&id, START + 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_dungeon_master_unlocks_once() {
    let mut ctx = context();
    let mut unlocked = 0;
    for _ in 0..12 {
        let report = ctx.on_dungeon_cleared(Rank::E, Difficulty::Normal, START);
        unlocked += report
            .progress
            .achievements
            .iter()
            .filter(|a| a.id == AchievementId::DungeonMaster)
            .count();
    }
    assert_eq!(unlocked, 1);
    assert!(ctx
        .quests()
        .achievements()
        .is_unlocked(AchievementId::DungeonMaster));
    assert_eq!(
        ctx.quests().achievements().unlocked_at(AchievementId::DungeonMaster),
        Some(START)
    );
}
