use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schedule snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("schedule snapshot is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum PlannerError {
    /// The completed task has no placement in the owner's schedule.
    #[error("task `{task}` is not in the schedule of `{owner}`")]
    TaskNotInSchedule { owner: String, task: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type PlannerResult<T> = Result<T, PlannerError>;
