//! Game clock with named periodic and one-shot tasks
//!
//! The clock only moves when the engine advances it, so pausing is simply
//! not advancing. Due tasks are handed out one at a time in time order so the
//! caller can start or cancel other tasks between them.

use std::collections::BTreeMap;

use serde::Serialize;

/// Named schedules. Declaration order breaks ties between tasks due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Bullet flight and hit resolution
    Physics,
    /// Robbery progress while one is running
    Robbery,
    /// Whole-second game time counter
    GameClock,
    /// Hostile NPC decisions
    Ai,
    /// Delayed completion of the active mission
    MissionDeadline,
}

#[derive(Debug, Clone, Copy)]
struct Schedule {
    /// `None` for one-shot tasks
    period_ms: Option<u64>,
    next_due_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Clock {
    now_ms: u64,
    schedules: BTreeMap<Task, Schedule>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Game time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Start (or restart) a repeating task, first firing one period from now
    pub fn start_periodic(&mut self, task: Task, period_ms: u64) {
        let period_ms = period_ms.max(1);
        self.schedules.insert(
            task,
            Schedule {
                period_ms: Some(period_ms),
                next_due_ms: self.now_ms + period_ms,
            },
        );
    }

    /// Start (or restart) a task that fires once after `delay_ms`
    pub fn start_once(&mut self, task: Task, delay_ms: u64) {
        self.schedules.insert(
            task,
            Schedule {
                period_ms: None,
                next_due_ms: self.now_ms + delay_ms,
            },
        );
    }

    pub fn cancel(&mut self, task: Task) -> bool {
        self.schedules.remove(&task).is_some()
    }

    pub fn is_scheduled(&self, task: Task) -> bool {
        self.schedules.contains_key(&task)
    }

    /// Milliseconds until `task` next fires
    pub fn due_in(&self, task: Task) -> Option<u64> {
        self.schedules
            .get(&task)
            .map(|s| s.next_due_ms.saturating_sub(self.now_ms))
    }

    /// Pop the earliest task due at or before `deadline_ms`, moving the clock to its due time
    pub fn pop_due(&mut self, deadline_ms: u64) -> Option<Task> {
        let (task, due) = self
            .schedules
            .iter()
            .filter(|(_, s)| s.next_due_ms <= deadline_ms)
            .min_by_key(|(task, s)| (s.next_due_ms, **task))
            .map(|(task, s)| (*task, s.next_due_ms))?;

        self.now_ms = self.now_ms.max(due);
        let period = self.schedules.get(&task).and_then(|s| s.period_ms);
        match period {
            Some(period) => {
                if let Some(schedule) = self.schedules.get_mut(&task) {
                    schedule.next_due_ms += period;
                }
            }
            None => {
                self.schedules.remove(&task);
            }
        }
        Some(task)
    }

    /// Move to `deadline_ms` once every due task has been popped
    pub fn settle(&mut self, deadline_ms: u64) {
        self.now_ms = self.now_ms.max(deadline_ms);
    }

    /// Give every repeating task a fresh interval from now (used on resume).
    /// One-shot tasks keep their due time.
    pub fn restart_intervals(&mut self) {
        let now = self.now_ms;
        for schedule in self.schedules.values_mut() {
            if let Some(period) = schedule.period_ms {
                schedule.next_due_ms = now + period;
            }
        }
    }
}
