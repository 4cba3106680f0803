use crate::core::rewards::RewardBundle;
use serde::{Deserialize, Serialize};

/// Objective target that matches every event target.
pub const ANY_TARGET: &str = "any";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestKind {
    Story,
    Side,
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveKind {
    Kill,
    Collect,
    CompleteDungeon,
    Upgrade,
    Extract,
}

impl ObjectiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectiveKind::Kill => "kill",
            ObjectiveKind::Collect => "collect",
            ObjectiveKind::CompleteDungeon => "complete_dungeon",
            ObjectiveKind::Upgrade => "upgrade",
            ObjectiveKind::Extract => "extract",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub kind: ObjectiveKind,
    pub target: String,
    pub required: u32,
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub completed: bool,
}

impl Objective {
    pub fn new(kind: ObjectiveKind, target: impl Into<String>, required: u32) -> Self {
        Self {
            kind,
            target: target.into(),
            required: required.max(1),
            current: 0,
            completed: false,
        }
    }

    pub fn matches(&self, kind: ObjectiveKind, target: &str) -> bool {
        self.kind == kind && (self.target == ANY_TARGET || self.target == target)
    }

    /// Adds progress, clamped to `required`. Returns true if this call
    /// completed the objective.
    pub fn advance(&mut self, amount: u32) -> bool {
        if self.completed {
            return false;
        }
        self.current = self.current.saturating_add(amount).min(self.required);
        if self.current >= self.required {
            self.completed = true;
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.required = self.required.max(1);
        self.current = 0;
        self.completed = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestStatus {
    Available,
    Active,
    Completed,
    Failed,
}

impl QuestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestStatus::Completed | QuestStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: QuestKind,
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub rewards: RewardBundle,
    #[serde(default)]
    pub started_at: Option<i64>,
    /// Time allowed once started (ms).
    #[serde(default)]
    pub time_limit: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub status: QuestStatus,
    #[serde(default)]
    pub finished_at: Option<i64>,
}

impl Quest {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: QuestKind,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            kind,
            objectives: Vec::new(),
            rewards: RewardBundle::default(),
            started_at: None,
            time_limit: None,
            expires_at: None,
            status: QuestStatus::Available,
            finished_at: None,
        }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_rewards(mut self, rewards: RewardBundle) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_time_limit(mut self, limit_ms: i64) -> Self {
        self.time_limit = Some(limit_ms);
        self
    }

    pub fn with_expiry(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Marks the quest active from `now`, clearing objective progress.
    pub(crate) fn start(&mut self, now: i64) {
        for objective in &mut self.objectives {
            objective.reset();
        }
        self.status = QuestStatus::Active;
        self.started_at = Some(now);
        self.finished_at = None;
        if let Some(limit) = self.time_limit {
            let deadline = now.saturating_add(limit);
            self.expires_at = Some(self.expires_at.map_or(deadline, |e| e.min(deadline)));
        }
    }

    pub fn is_complete(&self) -> bool {
        self.objectives.iter().all(|o| o.completed)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// A quest that just finished successfully, with its rewards to hand out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestCompletion {
    pub quest_id: String,
    pub title: String,
    pub rewards: RewardBundle,
}
