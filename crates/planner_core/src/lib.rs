pub mod clock;
pub mod config;
pub mod error;
pub mod interval;
pub mod placement;
pub mod record;
pub mod scheduler;
pub mod store;

pub use crate::clock::{day_bounds, Clock, FixedClock, PlanningWindow, SystemClock};
pub use crate::config::PlannerConfig;
pub use crate::error::{PlannerError, PlannerResult, StoreError};
pub use crate::interval::{free_intervals, BusyInterval, TimeSlot};
pub use crate::placement::{place_tasks, Placement, TaskToSchedule};
pub use crate::record::ScheduledTask;
pub use crate::scheduler::{DayScheduler, DaySchedulerBuilder, PlanOutcome};
pub use crate::store::{
    InMemoryScheduleStore, JsonFileScheduleStore, RecordFilter, ScheduleStore,
};
