use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A task placed at a fixed time in an owner's day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: String,
    pub owner: String,
    pub task: String,
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,
}

impl ScheduledTask {
    pub fn new(
        owner: impl Into<String>,
        task: impl Into<String>,
        planned_start: DateTime<Utc>,
        planned_end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner: owner.into(),
            task: task.into(),
            planned_start,
            planned_end,
        }
    }

    pub fn duration(&self) -> Duration {
        self.planned_end - self.planned_start
    }

    pub fn overlaps(&self, other: &ScheduledTask) -> bool {
        self.planned_start < other.planned_end && other.planned_start < self.planned_end
    }

    /// Key of the `(owner, planned_start)` index within one owner's records.
    pub(crate) fn index_key(&self) -> (DateTime<Utc>, String) {
        (self.planned_start, self.id.clone())
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.planned_start
            .cmp(&other.planned_start)
            .then_with(|| self.id.cmp(&other.id))
    }
}
