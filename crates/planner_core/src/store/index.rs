use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use super::RecordFilter;
use crate::{error::StoreError, record::ScheduledTask};

type OwnerRecords = BTreeMap<(DateTime<Utc>, String), ScheduledTask>;

#[derive(Debug, Clone, Default)]
pub(crate) struct RecordIndex {
    by_owner: HashMap<String, OwnerRecords>,
}

impl RecordIndex {
    pub(crate) fn from_records(
        records: impl IntoIterator<Item = ScheduledTask>,
    ) -> Result<Self, StoreError> {
        let mut index = Self::default();
        for record in records {
            validate(&record)?;
            index
                .by_owner
                .entry(record.owner.clone())
                .or_default()
                .insert(record.index_key(), record);
        }
        Ok(index)
    }

    pub(crate) fn list(&self, owner: &str) -> Vec<ScheduledTask> {
        self.by_owner
            .get(owner)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn all_records(&self) -> Vec<ScheduledTask> {
        let mut owners: Vec<&String> = self.by_owner.keys().collect();
        owners.sort();
        owners
            .into_iter()
            .flat_map(|owner| self.by_owner[owner].values().cloned())
            .collect()
    }

    pub(crate) fn replace(
        &mut self,
        owner: &str,
        filter: RecordFilter,
        records: Vec<ScheduledTask>,
    ) -> Result<usize, StoreError> {
        for record in &records {
            validate(record)?;
            if record.owner != owner {
                return Err(StoreError::Corrupt(format!(
                    "record `{}` belongs to `{}`, not `{}`",
                    record.id, record.owner, owner
                )));
            }
        }

        let removed = match self.by_owner.get_mut(owner) {
            Some(existing) => remove_matching(existing, filter),
            None => 0,
        };

        if !records.is_empty() {
            let entry = self.by_owner.entry(owner.to_string()).or_default();
            for record in records {
                entry.insert(record.index_key(), record);
            }
        }
        if self.by_owner.get(owner).is_some_and(BTreeMap::is_empty) {
            self.by_owner.remove(owner);
        }
        Ok(removed)
    }
}

fn remove_matching(records: &mut OwnerRecords, filter: RecordFilter) -> usize {
    match filter {
        RecordFilter::All => {
            let removed = records.len();
            records.clear();
            removed
        }
        RecordFilter::StartingAtOrAfter(at) => records.split_off(&(at, String::new())).len(),
        RecordFilter::StartingWithin { start, end } => {
            if start >= end {
                return 0;
            }
            let mut tail = records.split_off(&(start, String::new()));
            let mut keep = tail.split_off(&(end, String::new()));
            records.append(&mut keep);
            tail.len()
        }
    }
}

fn validate(record: &ScheduledTask) -> Result<(), StoreError> {
    if record.planned_start >= record.planned_end {
        return Err(StoreError::Corrupt(format!(
            "record `{}` ends before it starts",
            record.id
        )));
    }
    Ok(())
}
