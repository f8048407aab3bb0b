use std::path::PathBuf;

use chrono::{FixedOffset, NaiveTime, Offset, Utc};
use tracing::{info, warn};

const MAX_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlannerConfig {
    pub store_path: Option<PathBuf>,
    pub utc_offset_minutes: i32,
    pub day_end: Option<NaiveTime>,
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `PLANNER_*` variables. Unparsable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("PLANNER_STORE_PATH") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                info!(path = trimmed, "using schedule store");
                config.store_path = Some(PathBuf::from(trimmed));
            }
        }
        if let Some(offset) = lookup("PLANNER_UTC_OFFSET_MINUTES") {
            match offset.trim().parse::<i32>() {
                Ok(value) if value.abs() < MAX_OFFSET_MINUTES => {
                    config.utc_offset_minutes = value;
                }
                _ => warn!(value = %offset, "ignoring invalid PLANNER_UTC_OFFSET_MINUTES"),
            }
        }
        if let Some(day_end) = lookup("PLANNER_DAY_END") {
            match NaiveTime::parse_from_str(day_end.trim(), "%H:%M") {
                Ok(value) => config.day_end = Some(value),
                Err(err) => warn!(value = %day_end, %err, "ignoring invalid PLANNER_DAY_END"),
            }
        }
        config
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}
