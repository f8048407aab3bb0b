use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    clock::{day_bounds, Clock, PlanningWindow, SystemClock},
    config::PlannerConfig,
    error::{PlannerError, PlannerResult},
    interval::{free_intervals, BusyInterval, TimeSlot},
    placement::{place_tasks, TaskToSchedule},
    record::ScheduledTask,
    store::{InMemoryScheduleStore, RecordFilter, ScheduleStore},
};

/// What a planning call produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Task id of the first placement made, in input order, if any.
    pub first_task: Option<String>,
    /// New placements, ascending by start.
    pub scheduled: Vec<ScheduledTask>,
    /// Ids of tasks left out because they were malformed or did not fit.
    pub skipped: Vec<String>,
}

pub struct DayScheduler {
    store: Box<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    config: PlannerConfig,
    owner_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

pub struct DaySchedulerBuilder {
    store: Option<Box<dyn ScheduleStore>>,
    clock: Option<Arc<dyn Clock>>,
    config: PlannerConfig,
}

impl DaySchedulerBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: None,
            config: PlannerConfig::default(),
        }
    }

    pub fn with_store(mut self, store: impl ScheduleStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> DayScheduler {
        DayScheduler {
            store: self
                .store
                .unwrap_or_else(|| Box::new(InMemoryScheduleStore::new())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            config: self.config,
            owner_locks: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for DaySchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DayScheduler {
    pub fn builder() -> DaySchedulerBuilder {
        DaySchedulerBuilder::new()
    }

    /// Rebuilds the owner's whole day from now until the end of the day.
    ///
    /// Every existing placement for `owner` is dropped first, so repeating the
    /// call with the same inputs at the same instant yields the same schedule.
    #[instrument(skip(self, tasks, busy), fields(tasks = tasks.len(), busy = busy.len()))]
    pub fn plan_day(
        &self,
        owner: &str,
        tasks: &[TaskToSchedule],
        busy: &[BusyInterval],
    ) -> PlannerResult<PlanOutcome> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock();

        let window = self.window(self.clock.now());
        let free = free_intervals(window.start, window.end, busy);
        self.commit(owner, RecordFilter::All, tasks, &free)
    }

    /// Re-plans the rest of the day, keeping placements that started before now.
    ///
    /// Placements still running at now are treated as busy so new work is
    /// never stacked on top of them.
    #[instrument(skip(self, tasks, busy), fields(tasks = tasks.len(), busy = busy.len()))]
    pub fn replan(
        &self,
        owner: &str,
        tasks: &[TaskToSchedule],
        busy: &[BusyInterval],
    ) -> PlannerResult<PlanOutcome> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock();

        let now = self.clock.now();
        let window = self.window(now);
        let filter = RecordFilter::StartingAtOrAfter(now);
        let mut blocked = busy.to_vec();
        blocked.extend(
            self.store
                .list_for_owner(owner)?
                .into_iter()
                .filter(|record| !filter.matches(record))
                .map(|record| TimeSlot::new(record.planned_start, record.planned_end))
                .filter(|kept| kept.overlaps(window.start, window.end))
                .map(|kept| BusyInterval::new(kept.start, kept.end)),
        );
        let free = free_intervals(window.start, window.end, &blocked);
        self.commit(owner, filter, tasks, &free)
    }

    /// Drops the owner's placements that start on the current local day.
    #[instrument(skip(self))]
    pub fn clear_day(&self, owner: &str) -> PlannerResult<usize> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock();

        let (start, end) = day_bounds(self.clock.now(), self.config.offset());
        let removed = self
            .store
            .delete_for_owner(owner, RecordFilter::StartingWithin { start, end })?;
        info!(owner, removed, "cleared day");
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub fn delete_all_for_user(&self, owner: &str) -> PlannerResult<usize> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock();

        let removed = self.store.delete_for_owner(owner, RecordFilter::All)?;
        info!(owner, removed, "deleted all placements");
        Ok(removed)
    }

    /// Task that follows `completed_task` in the owner's schedule.
    ///
    /// `Ok(None)` means the completed task was the last one; a task with no
    /// placement at all is reported as [`PlannerError::TaskNotInSchedule`].
    pub fn next_task(&self, owner: &str, completed_task: &str) -> PlannerResult<Option<String>> {
        let records = self.store.list_for_owner(owner)?;
        let position = records
            .iter()
            .position(|record| record.task == completed_task)
            .ok_or_else(|| PlannerError::TaskNotInSchedule {
                owner: owner.to_string(),
                task: completed_task.to_string(),
            })?;
        Ok(records.get(position + 1).map(|record| record.task.clone()))
    }

    /// All placements for `owner`, ascending by start.
    pub fn scheduled_tasks(&self, owner: &str) -> PlannerResult<Vec<ScheduledTask>> {
        Ok(self.store.list_for_owner(owner)?)
    }
}

impl DayScheduler {
    fn window(&self, now: DateTime<Utc>) -> PlanningWindow {
        PlanningWindow::for_day(now, self.config.offset(), self.config.day_end)
    }

    fn owner_lock(&self, owner: &str) -> Arc<Mutex<()>> {
        self.owner_locks
            .lock()
            .entry(owner.to_string())
            .or_default()
            .clone()
    }

    fn commit(
        &self,
        owner: &str,
        filter: RecordFilter,
        tasks: &[TaskToSchedule],
        free: &[TimeSlot],
    ) -> PlannerResult<PlanOutcome> {
        let placement = place_tasks(owner, tasks, free);
        debug!(
            owner,
            free_slots = free.len(),
            placed = placement.scheduled.len(),
            "computed placement"
        );

        let removed = self
            .store
            .replace_for_owner(owner, filter, placement.scheduled.clone())?;

        let first_task = placement
            .scheduled
            .first()
            .map(|record| record.task.clone());
        let mut scheduled = placement.scheduled;
        scheduled.sort();
        info!(
            owner,
            removed,
            placed = scheduled.len(),
            skipped = placement.skipped.len(),
            first_task = first_task.as_deref().unwrap_or("-"),
            "schedule committed"
        );
        Ok(PlanOutcome {
            first_task,
            scheduled,
            skipped: placement.skipped,
        })
    }
}
