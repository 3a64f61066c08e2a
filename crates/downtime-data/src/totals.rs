//! Daily, weekly and monthly downtime totals.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use downtime_core::clock::local_instant;
use downtime_core::models::DowntimeInterval;
use downtime_core::shift::ShiftTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTotals {
    pub daily_ms: u64,
    pub weekly_ms: u64,
    pub monthly_ms: u64,
}

/// Sum interval durations per calendar period in `tz`.
///
/// An interval counts toward a period when it ended at or after the period's
/// local midnight start. Weeks start on Sunday.
pub fn time_totals(intervals: &[DowntimeInterval], tz: Tz, now: DateTime<Utc>) -> TimeTotals {
    let today = now.with_timezone(&tz).date_naive();
    let week_start = today
        .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_sunday())))
        .unwrap_or(today);
    let month_start = today.with_day(1).unwrap_or(today);

    let sum_since = |date: NaiveDate| -> u64 {
        let start = period_start(tz, date);
        intervals
            .iter()
            .filter(|i| i.end >= start)
            .map(|i| i.duration_ms)
            .sum()
    };

    TimeTotals {
        daily_ms: sum_since(today),
        weekly_ms: sum_since(week_start),
        monthly_ms: sum_since(month_start),
    }
}

/// Local midnight of `date`; in zones that skip midnight on a DST change,
/// the first valid hour of that day.
fn period_start(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    (0..24)
        .filter_map(|h| ShiftTime::from_hm(h, 0))
        .find_map(|t| local_instant(tz, date, t))
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN).and_utc())
}
