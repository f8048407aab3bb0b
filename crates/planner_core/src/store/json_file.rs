use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{index::RecordIndex, RecordFilter, ScheduleStore};
use crate::{error::StoreError, record::ScheduledTask};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    records: Vec<ScheduledTask>,
}

/// Store backed by a JSON snapshot on disk.
///
/// Every mutation is applied to a copy of the index, written to a sibling
/// temporary file and renamed over the snapshot before it becomes visible, so a
/// failed write leaves both the file and the in-memory view untouched.
#[derive(Debug)]
pub struct JsonFileScheduleStore {
    path: PathBuf,
    index: RwLock<RecordIndex>,
}

impl JsonFileScheduleStore {
    /// Opens the snapshot at `path`, starting empty when the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let index = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let snapshot: Snapshot = serde_json::from_str(&raw)?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(StoreError::Corrupt(format!(
                    "unsupported snapshot version {}",
                    snapshot.version
                )));
            }
            RecordIndex::from_records(snapshot.records)?
        } else {
            RecordIndex::default()
        };
        tracing::debug!(path = %path.display(), "opened schedule store");
        Ok(Self {
            path,
            index: RwLock::new(index),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, index: &RecordIndex) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            records: index.all_records(),
        };
        let payload = serde_json::to_string_pretty(&snapshot)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, payload).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl ScheduleStore for JsonFileScheduleStore {
    fn list_for_owner(&self, owner: &str) -> Result<Vec<ScheduledTask>, StoreError> {
        Ok(self.index.read().list(owner))
    }

    fn replace_for_owner(
        &self,
        owner: &str,
        filter: RecordFilter,
        records: Vec<ScheduledTask>,
    ) -> Result<usize, StoreError> {
        let mut guard = self.index.write();
        let mut next = guard.clone();
        let removed = next.replace(owner, filter, records)?;
        self.persist(&next)?;
        *guard = next;
        Ok(removed)
    }
}
