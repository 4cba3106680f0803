//! Daily quest templates and the local-midnight reset clock.

use super::types::{Objective, ObjectiveKind, Quest, QuestKind, ANY_TARGET};
use crate::core::constants::MS_PER_DAY;
use crate::core::rewards::RewardBundle;
use crate::items::types::Item;
use chrono::{Local, TimeZone};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyTemplate {
    Hunt,
    Collect,
    CompleteDungeon,
    Upgrade,
    Extract,
}

impl DailyTemplate {
    pub const ALL: [DailyTemplate; 5] = [
        DailyTemplate::Hunt,
        DailyTemplate::Collect,
        DailyTemplate::CompleteDungeon,
        DailyTemplate::Upgrade,
        DailyTemplate::Extract,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DailyTemplate::Hunt => "hunt",
            DailyTemplate::Collect => "collect",
            DailyTemplate::CompleteDungeon => "complete_dungeon",
            DailyTemplate::Upgrade => "upgrade",
            DailyTemplate::Extract => "extract",
        }
    }

    /// Builds a quest from this template, expiring at `expires_at`.
    pub fn build(&self, id: String, expires_at: i64, rng: &mut impl Rng) -> Quest {
        let quest = match self {
            DailyTemplate::Hunt => {
                let required = rng.gen_range(10..30);
                Quest::new(id, "Daily Hunt", format!("Defeat {} enemies", required), QuestKind::Daily)
                    .with_objective(Objective::new(ObjectiveKind::Kill, ANY_TARGET, required))
                    .with_rewards(RewardBundle::new(100, 500))
            }
            DailyTemplate::Collect => {
                let required = rng.gen_range(5..15);
                Quest::new(id, "Daily Gathering", format!("Collect {} items", required), QuestKind::Daily)
                    .with_objective(Objective::new(ObjectiveKind::Collect, ANY_TARGET, required))
                    .with_rewards(RewardBundle::new(150, 300).with_items(vec![
                        Item::health_potion(),
                        Item::health_potion(),
                        Item::health_potion(),
                    ]))
            }
            DailyTemplate::CompleteDungeon => {
                Quest::new(id, "Dungeon Run", "Clear a dungeon", QuestKind::Daily)
                    .with_objective(Objective::new(ObjectiveKind::CompleteDungeon, ANY_TARGET, 1))
                    .with_rewards(RewardBundle::new(300, 1000))
            }
            DailyTemplate::Upgrade => {
                Quest::new(id, "Sharpen the Blade", "Upgrade a piece of equipment", QuestKind::Daily)
                    .with_objective(Objective::new(ObjectiveKind::Upgrade, ANY_TARGET, 1))
                    .with_rewards(RewardBundle::new(200, 800))
            }
            DailyTemplate::Extract => {
                Quest::new(id, "Rise", "Extract 3 shadows", QuestKind::Daily)
                    .with_objective(Objective::new(ObjectiveKind::Extract, ANY_TARGET, 3))
                    .with_rewards(RewardBundle::new(250, 600).with_skill_points(1))
            }
        };
        quest.with_expiry(expires_at)
    }
}

/// Picks `count` distinct templates (all of them if `count` exceeds five)
/// and builds a batch expiring at `expires_at`.
pub fn generate_daily_batch(count: usize, expires_at: i64, rng: &mut impl Rng) -> Vec<Quest> {
    let mut pool: Vec<DailyTemplate> = DailyTemplate::ALL.to_vec();
    let mut batch = Vec::with_capacity(count.min(pool.len()));
    let mut index = 0;
    while index < count && !pool.is_empty() {
        let template = pool.swap_remove(rng.gen_range(0..pool.len()));
        let id = format!("daily-{}-{}-{}", expires_at, index, template.name());
        batch.push(template.build(id, expires_at, rng));
        index += 1;
    }
    batch
}

/// Timestamp (ms) of the first local midnight strictly after `now`.
pub fn next_daily_reset(now: i64) -> i64 {
    let fallback = now.saturating_add(MS_PER_DAY);
    let Some(current) = Local.timestamp_millis_opt(now).single() else {
        return fallback;
    };
    let Some(tomorrow) = current.date_naive().succ_opt() else {
        return fallback;
    };
    // A zone may skip midnight on DST days; take the first valid hour.
    (0..3)
        .filter_map(|hour| tomorrow.and_hms_opt(hour, 0, 0))
        .find_map(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(fallback)
}
