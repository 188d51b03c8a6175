//! Timezone-correct date window resolution
//!
//! Pure functions of an injected instant and a market's fixed UTC offset:
//! no ambient clock reads, so every window is reproducible in tests.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// The calendar boundaries one market's run operates over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindows {
    /// Today's calendar date in the market's local time
    pub today: NaiveDate,
    /// Same weekday, seven days earlier
    pub same_day_last_week: NaiveDate,
    /// First calendar date of the current local month
    pub mtd_start: NaiveDate,
    /// Oldest date of the trailing history window (inclusive)
    pub history_start: NaiveDate,
    /// Local wall-clock instant exactly seven days before "now".
    ///
    /// Hour ceiling for the same-day-last-week comparison: today's window
    /// is naturally truncated at "now", so last week's window is truncated
    /// to the same local hour-of-day to keep partial-day totals comparable.
    pub last_week_cutoff: NaiveDateTime,
}

/// Resolve all windows for one market from a fixed instant.
///
/// `history_days` is the inclusive length of the trailing daily window;
/// a value of 1 means "today only".
pub fn resolve(now: DateTime<Utc>, offset: FixedOffset, history_days: u32) -> DateWindows {
    let local_now = now.with_timezone(&offset);
    let today = local_now.date_naive();

    let mtd_start = today
        .with_day(1)
        .expect("the first of the current month is always a valid date");

    DateWindows {
        today,
        same_day_last_week: today - Duration::days(7),
        mtd_start,
        history_start: today - Duration::days(i64::from(history_days.max(1)) - 1),
        last_week_cutoff: (local_now - Duration::days(7)).naive_local(),
    }
}
