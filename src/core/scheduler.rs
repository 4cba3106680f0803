//! Deadline queue for deferred work.

use crate::army::MissionId;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

/// Work to run once its deadline passes. Variant order breaks ties between
/// equal deadlines: missions settle before quests expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerAction {
    CompleteMission(MissionId),
    QuestExpiry,
    DailyReset,
    LoyaltyRegen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timer {
    pub deadline: i64,
    pub action: TimerAction,
}

/// Min-heap of timers with a set of the queued ones for constant-time dedupe.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Timer>>,
    queued: HashSet<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a timer. An identical (deadline, action) pair is kept once.
    pub fn schedule(&mut self, deadline: i64, action: TimerAction) {
        let timer = Timer { deadline, action };
        if self.queued.insert(timer) {
            self.heap.push(Reverse(timer));
        }
    }

    /// Removes and returns the earliest timer if it is due at `now`.
    pub fn pop_due(&mut self, now: i64) -> Option<Timer> {
        match self.heap.peek() {
            Some(Reverse(timer)) if timer.deadline <= now => {
                let Reverse(timer) = self.heap.pop()?;
                self.queued.remove(&timer);
                Some(timer)
            }
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.heap.peek().map(|Reverse(t)| t.deadline)
    }

    pub fn contains(&self, action: TimerAction) -> bool {
        self.heap.iter().any(|Reverse(t)| t.action == action)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.queued.clear();
    }
}
