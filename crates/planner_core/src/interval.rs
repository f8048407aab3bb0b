use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Externally committed calendar time the planner must leave untouched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

/// Half-open `[start, end)` span of free time inside a planning window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}

/// Subtracts `busy` from `[from, until)`.
///
/// Busy intervals may arrive unsorted, overlapping, nested, or partially outside
/// the window. Malformed intervals (`start >= end`) are ignored. The result is
/// ascending and non-overlapping, and never reaches past `until`.
pub fn free_intervals(
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    busy: &[BusyInterval],
) -> Vec<TimeSlot> {
    if from >= until {
        return Vec::new();
    }

    let mut sorted: Vec<BusyInterval> = busy
        .iter()
        .filter(|interval| {
            if !interval.is_valid() {
                tracing::debug!(start = %interval.start, end = %interval.end, "ignoring malformed busy interval");
                return false;
            }
            true
        })
        .copied()
        .collect();
    sorted.sort_by_key(|interval| interval.start);

    let mut slots = Vec::new();
    let mut cursor = from;
    for interval in &sorted {
        if cursor >= until {
            break;
        }
        if interval.start > cursor {
            let end = interval.start.min(until);
            slots.push(TimeSlot::new(cursor, end));
        }
        cursor = cursor.max(interval.end);
    }
    if cursor < until {
        slots.push(TimeSlot::new(cursor, until));
    }
    slots
}
