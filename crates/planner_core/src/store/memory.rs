use parking_lot::RwLock;

use super::{index::RecordIndex, RecordFilter, ScheduleStore};
use crate::{error::StoreError, record::ScheduledTask};

/// Process-local store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    index: RwLock<RecordIndex>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ScheduledTask>) -> Result<Self, StoreError> {
        Ok(Self {
            index: RwLock::new(RecordIndex::from_records(records)?),
        })
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn list_for_owner(&self, owner: &str) -> Result<Vec<ScheduledTask>, StoreError> {
        Ok(self.index.read().list(owner))
    }

    fn replace_for_owner(
        &self,
        owner: &str,
        filter: RecordFilter,
        records: Vec<ScheduledTask>,
    ) -> Result<usize, StoreError> {
        self.index.write().replace(owner, filter, records)
    }
}
