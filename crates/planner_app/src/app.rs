use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use planner_core::{
    BusyInterval, Clock, DayScheduler, FixedClock, JsonFileScheduleStore, PlannerConfig,
    SystemClock, TaskToSchedule,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

const DEFAULT_STORE_FILE: &str = "day_planner.json";

/// Caller-supplied planning input: pending tasks in priority order and busy calendar time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanRequest {
    #[serde(default)]
    pub tasks: Vec<TaskToSchedule>,
    #[serde(default)]
    pub busy: Vec<BusyInterval>,
}

impl PlanRequest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading plan request `{}`", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing plan request `{}`", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Plan { user: String, request: PlanRequest },
    Replan { user: String, request: PlanRequest },
    Clear { user: String },
    Purge { user: String },
    Next { user: String, completed: String },
    List { user: String },
}

/// Process-level settings resolved from the environment and command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub planner: PlannerConfig,
    pub now: Option<DateTime<Utc>>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            planner: PlannerConfig::from_env(),
            now: None,
        }
    }

    pub fn with_store_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.planner.store_path = Some(path);
        }
        self
    }

    pub fn with_now(mut self, now: Option<DateTime<Utc>>) -> Self {
        if now.is_some() {
            self.now = now;
        }
        self
    }

    pub fn store_path(&self) -> PathBuf {
        self.planner
            .store_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE))
    }
}

pub fn build_scheduler(config: &AppConfig) -> Result<DayScheduler> {
    let path = config.store_path();
    let store = JsonFileScheduleStore::open(&path)
        .with_context(|| format!("opening schedule store `{}`", path.display()))?;
    let clock: Arc<dyn Clock> = match config.now {
        Some(now) => Arc::new(FixedClock::new(now)),
        None => Arc::new(SystemClock),
    };
    info!(store = %store.path().display(), pinned_now = config.now.is_some(), "scheduler ready");
    Ok(DayScheduler::builder()
        .with_store(store)
        .with_clock(clock)
        .with_config(config.planner.clone())
        .build())
}

pub fn execute(scheduler: &DayScheduler, command: Command) -> Result<Value> {
    let output = match command {
        Command::Plan { user, request } => {
            let outcome = scheduler
                .plan_day(&user, &request.tasks, &request.busy)
                .with_context(|| format!("planning the day for `{user}`"))?;
            serde_json::to_value(outcome)?
        }
        Command::Replan { user, request } => {
            let outcome = scheduler
                .replan(&user, &request.tasks, &request.busy)
                .with_context(|| format!("re-planning the day for `{user}`"))?;
            serde_json::to_value(outcome)?
        }
        Command::Clear { user } => {
            let removed = scheduler.clear_day(&user)?;
            json!({ "removed": removed })
        }
        Command::Purge { user } => {
            let removed = scheduler.delete_all_for_user(&user)?;
            json!({ "removed": removed })
        }
        Command::Next { user, completed } => {
            let next_task = scheduler.next_task(&user, &completed)?;
            json!({ "next_task": next_task })
        }
        Command::List { user } => {
            let scheduled = scheduler.scheduled_tasks(&user)?;
            json!({ "scheduled": scheduled })
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 7, hour, minute, 0).unwrap()
    }

    fn config_in(dir: &Path, now: DateTime<Utc>) -> AppConfig {
        AppConfig::default()
            .with_store_path(Some(dir.join("plan.json")))
            .with_now(Some(now))
    }

    #[test]
    fn loads_request_with_missing_sections() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("request.json");
        fs::write(&path, r#"{ "tasks": [{ "id": "a", "duration": 30 }, { "id": "b" }] }"#)
            .expect("write fixture");
        let request = PlanRequest::load(&path).expect("load request");
        assert_eq!(request.tasks.len(), 2);
        assert_eq!(request.tasks[1].duration_minutes, None);
        assert!(request.busy.is_empty());
    }

    #[test]
    fn null_duration_is_skipped_instead_of_failing_the_request() {
        let temp = tempdir().expect("tempdir");
        let config = config_in(temp.path(), at(8, 0));
        let request: PlanRequest = serde_json::from_str(
            r#"{ "tasks": [{ "id": "a", "duration": 30 }, { "id": "b", "duration": null }] }"#,
        )
        .expect("request with null duration parses");
        assert_eq!(request.tasks.len(), 2);

        let scheduler = build_scheduler(&config).expect("scheduler");
        let planned = execute(
            &scheduler,
            Command::Plan {
                user: "ana".into(),
                request,
            },
        )
        .expect("plan");
        assert_eq!(planned["first_task"], json!("a"));
        assert_eq!(planned["skipped"], json!(["b"]));
    }

    #[test]
    fn plan_then_next_round_trip_through_store() {
        let temp = tempdir().expect("tempdir");
        let config = config_in(temp.path(), at(8, 0));
        let request: PlanRequest = serde_json::from_value(json!({
            "tasks": [{ "id": "1", "duration": 90 }, { "id": "2", "duration": 30 }],
            "busy": [{ "start": "2025-11-07T08:00:00Z", "end": "2025-11-07T10:00:00Z" }]
        }))
        .expect("request json");

        let scheduler = build_scheduler(&config).expect("scheduler");
        let planned = execute(
            &scheduler,
            Command::Plan {
                user: "ana".into(),
                request,
            },
        )
        .expect("plan");
        assert_eq!(planned["first_task"], json!("1"));
        assert_eq!(planned["scheduled"][0]["planned_start"], json!("2025-11-07T10:00:00Z"));

        let reopened = build_scheduler(&config).expect("scheduler");
        let next = execute(
            &reopened,
            Command::Next {
                user: "ana".into(),
                completed: "1".into(),
            },
        )
        .expect("next");
        assert_eq!(next, json!({ "next_task": "2" }));

        let missing = execute(
            &reopened,
            Command::Next {
                user: "ana".into(),
                completed: "zzz".into(),
            },
        );
        assert!(missing.is_err());

        let purged = execute(&reopened, Command::Purge { user: "ana".into() }).expect("purge");
        assert_eq!(purged, json!({ "removed": 2 }));
        let listed = execute(&reopened, Command::List { user: "ana".into() }).expect("list");
        assert_eq!(listed, json!({ "scheduled": [] }));
    }

    #[test]
    fn store_path_falls_back_to_default_file() {
        assert_eq!(
            AppConfig::default().store_path(),
            PathBuf::from(DEFAULT_STORE_FILE)
        );
    }
}
