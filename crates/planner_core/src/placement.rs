use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{interval::TimeSlot, record::ScheduledTask};

/// A pending task supplied by the caller. Input order is priority order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskToSchedule {
    pub id: String,
    /// Requested length in whole minutes. Missing, null or non-positive values are skipped.
    #[serde(rename = "duration", default)]
    pub duration_minutes: Option<i64>,
}

impl TaskToSchedule {
    pub fn new(id: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            id: id.into(),
            duration_minutes: Some(duration_minutes),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        let minutes = self.duration_minutes.filter(|minutes| *minutes > 0)?;
        Duration::try_minutes(minutes)
    }
}

/// Result of one placement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// New records in placement order.
    pub scheduled: Vec<ScheduledTask>,
    /// Ids of tasks that were malformed or did not fit anywhere.
    pub skipped: Vec<String>,
}

/// Greedy first-fit placement in input order.
///
/// Each task takes the front of the earliest slot long enough to hold it; the
/// rest of that slot stays available. Tasks that fit nowhere are skipped.
pub fn place_tasks(owner: &str, tasks: &[TaskToSchedule], free: &[TimeSlot]) -> Placement {
    let mut slots = free.to_vec();
    let mut placement = Placement::default();

    for task in tasks {
        let Some(duration) = task.duration() else {
            tracing::debug!(task = %task.id, minutes = ?task.duration_minutes, "skipping task without a positive duration");
            placement.skipped.push(task.id.clone());
            continue;
        };

        let Some(slot) = slots.iter_mut().find(|slot| slot.length() >= duration) else {
            tracing::debug!(task = %task.id, minutes = ?task.duration_minutes, "no free slot large enough");
            placement.skipped.push(task.id.clone());
            continue;
        };

        let start = slot.start;
        let end = start + duration;
        slot.start = end;
        placement
            .scheduled
            .push(ScheduledTask::new(owner, task.id.clone(), start, end));
    }

    placement
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 7, hour, minute, 0).unwrap()
    }

    fn spans(placement: &Placement) -> Vec<(&str, DateTime<Utc>, DateTime<Utc>)> {
        placement
            .scheduled
            .iter()
            .map(|record| (record.task.as_str(), record.planned_start, record.planned_end))
            .collect()
    }

    #[test]
    fn skips_early_gap_that_is_too_short() {
        let free = [
            TimeSlot::new(at(8, 0), at(9, 0)),
            TimeSlot::new(at(10, 0), at(18, 0)),
        ];
        let tasks = [TaskToSchedule::new("1", 90), TaskToSchedule::new("2", 30)];
        let placement = place_tasks("ana", &tasks, &free);
        assert_eq!(
            spans(&placement),
            vec![("1", at(10, 0), at(11, 30)), ("2", at(11, 30), at(12, 0))]
        );
        assert!(placement.skipped.is_empty());
    }

    #[test]
    fn later_small_task_backfills_earlier_gap() {
        let free = [
            TimeSlot::new(at(8, 0), at(9, 0)),
            TimeSlot::new(at(10, 0), at(18, 0)),
        ];
        let tasks = [TaskToSchedule::new("big", 90), TaskToSchedule::new("small", 45)];
        let placement = place_tasks("ana", &tasks, &free);
        assert_eq!(
            spans(&placement),
            vec![("big", at(10, 0), at(11, 30)), ("small", at(8, 0), at(8, 45))]
        );
    }

    #[test]
    fn keeps_input_order_under_tight_capacity() {
        let free = [TimeSlot::new(at(9, 0), at(10, 30))];
        let tasks = [TaskToSchedule::new("A", 60), TaskToSchedule::new("B", 60)];
        let placement = place_tasks("ana", &tasks, &free);
        assert_eq!(spans(&placement), vec![("A", at(9, 0), at(10, 0))]);
        assert_eq!(placement.skipped, vec!["B".to_string()]);
    }

    #[test]
    fn exact_fit_consumes_the_slot() {
        let free = [TimeSlot::new(at(9, 0), at(10, 0))];
        let tasks = [TaskToSchedule::new("A", 60), TaskToSchedule::new("B", 1)];
        let placement = place_tasks("ana", &tasks, &free);
        assert_eq!(spans(&placement), vec![("A", at(9, 0), at(10, 0))]);
        assert_eq!(placement.skipped, vec!["B".to_string()]);
    }

    #[test]
    fn skips_non_positive_durations() {
        let free = [TimeSlot::new(at(9, 0), at(12, 0))];
        let tasks = [
            TaskToSchedule::new("zero", 0),
            TaskToSchedule::new("negative", -15),
            TaskToSchedule::new("ok", 30),
        ];
        let placement = place_tasks("ana", &tasks, &free);
        assert_eq!(spans(&placement), vec![("ok", at(9, 0), at(9, 30))]);
        assert_eq!(placement.skipped, vec!["zero".to_string(), "negative".to_string()]);
    }

    #[test]
    fn missing_duration_deserializes_as_unschedulable() {
        let task: TaskToSchedule = serde_json::from_str(r#"{ "id": "t" }"#).unwrap();
        assert_eq!(task.duration(), None);
        let task: TaskToSchedule =
            serde_json::from_str(r#"{ "id": "t", "duration": null }"#).unwrap();
        assert_eq!(task.duration_minutes, None);
        assert_eq!(task.duration(), None);
        let task: TaskToSchedule = serde_json::from_str(r#"{ "id": "t", "duration": 25 }"#).unwrap();
        assert_eq!(task.duration(), Some(Duration::minutes(25)));
    }

    #[test]
    fn null_duration_lands_in_skipped() {
        let free = [TimeSlot::new(at(9, 0), at(12, 0))];
        let tasks: Vec<TaskToSchedule> = serde_json::from_str(
            r#"[{ "id": "a", "duration": 30 }, { "id": "b", "duration": null }]"#,
        )
        .unwrap();
        let placement = place_tasks("ana", &tasks, &free);
        assert_eq!(spans(&placement), vec![("a", at(9, 0), at(9, 30))]);
        assert_eq!(placement.skipped, vec!["b".to_string()]);
    }

    #[test]
    fn placements_are_contiguous_and_disjoint() {
        let free = [TimeSlot::new(at(8, 0), at(12, 0))];
        let tasks: Vec<TaskToSchedule> = (0..5)
            .map(|idx| TaskToSchedule::new(format!("t{idx}"), 40))
            .collect();
        let placement = place_tasks("ana", &tasks, &free);
        assert_eq!(placement.scheduled.len(), 5);
        for pair in placement.scheduled.windows(2) {
            assert_eq!(pair[0].planned_end, pair[1].planned_start);
            assert!(!pair[0].overlaps(&pair[1]));
        }
    }
}
