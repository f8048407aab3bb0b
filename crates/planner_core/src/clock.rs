use chrono::{DateTime, Days, FixedOffset, NaiveDateTime, NaiveTime, TimeZone, Utc};
use parking_lot::Mutex;

/// Source of "now" for planning decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// The `[start, end)` span a planning call may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PlanningWindow {
    /// Window from `now` to the end of the local day.
    ///
    /// The day ends at `day_end` when that local time is still ahead of `now`,
    /// otherwise at the next local midnight.
    pub fn for_day(now: DateTime<Utc>, offset: FixedOffset, day_end: Option<NaiveTime>) -> Self {
        let (_, midnight) = day_bounds(now, offset);
        let end = day_end
            .and_then(|time| {
                let local_date = now.with_timezone(&offset).date_naive();
                offset
                    .from_local_datetime(&local_date.and_time(time))
                    .single()
            })
            .map(|local| local.with_timezone(&Utc))
            .filter(|end| *end > now)
            .unwrap_or(midnight);
        Self { start: now, end }
    }
}

/// Local midnight-to-midnight bounds of the day containing `now`, in UTC.
pub fn day_bounds(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_date = now.with_timezone(&offset).date_naive();
    let start_local = local_date.and_time(NaiveTime::MIN);
    let end_local = local_date
        .checked_add_days(Days::new(1))
        .unwrap_or(local_date)
        .and_time(NaiveTime::MIN);
    let to_utc = |naive: NaiveDateTime| {
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or(now)
    };
    (to_utc(start_local), to_utc(end_local))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 7, hour, minute, 0).unwrap()
    }

    #[test]
    fn window_runs_to_midnight_by_default() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let window = PlanningWindow::for_day(utc(8, 15), offset, None);
        assert!(window.start < window.end);
        assert_eq!(window.start, utc(8, 15));
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 11, 8, 0, 0, 0).unwrap());
    }

    #[test]
    fn window_honours_configured_day_end() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let six_pm = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        let window = PlanningWindow::for_day(utc(8, 0), offset, Some(six_pm));
        assert_eq!(window.end, utc(18, 0));

        let after_hours = PlanningWindow::for_day(utc(19, 0), offset, Some(six_pm));
        assert!(after_hours.start < after_hours.end);
        assert_eq!(
            after_hours.end,
            Utc.with_ymd_and_hms(2025, 11, 8, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn day_bounds_follow_local_offset() {
        // 23:30 UTC is already the next day at UTC+02:00.
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let (start, end) = day_bounds(utc(23, 30), offset);
        assert_eq!(start, utc(22, 0));
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 11, 8, 22, 0, 0).unwrap());
    }

    #[test]
    fn fixed_clock_can_be_moved() {
        let clock = FixedClock::new(utc(9, 0));
        assert_eq!(clock.now(), utc(9, 0));
        clock.set(utc(11, 0));
        assert_eq!(clock.now(), utc(11, 0));
    }
}
