//! Persistence seam for scheduled-task records.
//!
//! Records are partitioned by owner and kept in a `(planned_start, id)` ordered
//! index, so listing is already sorted and "starting at or after" deletions are
//! a single split of the index.

mod index;
mod json_file;
mod memory;

use chrono::{DateTime, Utc};

use crate::{error::StoreError, record::ScheduledTask};

pub use self::json_file::JsonFileScheduleStore;
pub use self::memory::InMemoryScheduleStore;

/// Selects an owner's records by `planned_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    All,
    StartingAtOrAfter(DateTime<Utc>),
    /// Half-open `[start, end)` range of start times.
    StartingWithin {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl RecordFilter {
    pub fn matches(&self, record: &ScheduledTask) -> bool {
        match *self {
            RecordFilter::All => true,
            RecordFilter::StartingAtOrAfter(at) => record.planned_start >= at,
            RecordFilter::StartingWithin { start, end } => {
                record.planned_start >= start && record.planned_start < end
            }
        }
    }
}

pub trait ScheduleStore: Send + Sync {
    /// All records for `owner`, ascending by `planned_start`.
    fn list_for_owner(&self, owner: &str) -> Result<Vec<ScheduledTask>, StoreError>;

    /// Removes the owner's records matched by `filter` and inserts `records`
    /// as one operation. Readers see either the old or the new state.
    ///
    /// Returns the number of removed records.
    fn replace_for_owner(
        &self,
        owner: &str,
        filter: RecordFilter,
        records: Vec<ScheduledTask>,
    ) -> Result<usize, StoreError>;

    fn delete_for_owner(&self, owner: &str, filter: RecordFilter) -> Result<usize, StoreError> {
        self.replace_for_owner(owner, filter, Vec::new())
    }
}
