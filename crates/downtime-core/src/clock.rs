//! Shift-intersected downtime.
//!
//! [`active_downtime_ms`] is the live counter shown next to a stopped
//! machine: the part of `[start, now)` that falls inside the shift, sampled
//! one wall-clock minute at a time. Every minute bucket is counted wholly in
//! or wholly out of the shift based on the instant at which the bucket
//! starts, even when the shift boundary falls mid-minute. Displays, rounding
//! and the daily reset all assume this minute granularity.
//!
//! All functions take `now` explicitly and never read the system clock.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::models::MachineSnapshot;
use crate::shift::{ShiftTime, ShiftWindow};

/// Length of one sampling bucket.
pub const MINUTE_MS: i64 = 60_000;

// ── DowntimeClock ─────────────────────────────────────────────────────────────

/// Milliseconds of `[start, now)` that fall inside `shift`.
///
/// * `start >= now` → `0`.
/// * Shift disabled → exact `now - start`, no truncation.
/// * `now` before the first minute boundary after `start` → the whole span
///   if `start` is in-shift, else `0`. Membership is not re-checked at `now`.
/// * Otherwise: the head fragment up to the first boundary counts if `start`
///   is in-shift, each full minute counts if its first instant is in-shift,
///   and the tail fragment counts if the last cursor is in-shift.
pub fn active_downtime_ms(start: DateTime<Utc>, shift: &ShiftWindow, now: DateTime<Utc>) -> u64 {
    let start_ms = start.timestamp_millis();
    let now_ms = now.timestamp_millis();

    if start_ms >= now_ms {
        return 0;
    }

    if !shift.enabled() {
        return (now_ms - start_ms) as u64;
    }

    let first_boundary = (start_ms.div_euclid(MINUTE_MS) + 1) * MINUTE_MS;
    let start_active = shift.is_active(start);

    // Single-bucket fast path.
    if now_ms < first_boundary {
        return if start_active {
            (now_ms - start_ms) as u64
        } else {
            0
        };
    }

    let mut active_ms: i64 = 0;
    if start_active {
        active_ms += first_boundary - start_ms;
    }

    let mut cursor = first_boundary;
    while cursor + MINUTE_MS <= now_ms {
        if active_at(shift, cursor) {
            active_ms += MINUTE_MS;
        }
        cursor += MINUTE_MS;
    }

    if active_at(shift, cursor) {
        active_ms += now_ms - cursor;
    }

    active_ms as u64
}

/// Live downtime of the stoppage a machine is currently in.
///
/// `0` for running machines and for snapshots whose `last_updated` could not
/// be parsed.
pub fn live_downtime_ms(machine: &MachineSnapshot, shift: &ShiftWindow, now: DateTime<Utc>) -> u64 {
    if !machine.is_stopped() {
        return 0;
    }
    machine
        .last_updated
        .map_or(0, |since| active_downtime_ms(since, shift, now))
}

fn active_at(shift: &ShiftWindow, epoch_ms: i64) -> bool {
    DateTime::from_timestamp_millis(epoch_ms).is_some_and(|t| shift.is_active(t))
}

// ── Shift calendar ────────────────────────────────────────────────────────────

/// How much of today's shift has already elapsed at `now`.
///
/// * Shift disabled → time since local midnight.
/// * Before today's shift start → `0`.
/// * Same-day shift already closed → full shift length.
/// * Otherwise → `now - today's shift start`.
///
/// Overnight shifts are measured from today's opening time only, so the
/// early-morning tail of last night's shift reports `0`.
pub fn elapsed_shift_time_today(shift: &ShiftWindow, now: DateTime<Utc>) -> u64 {
    let tz = shift.tz();
    let today = now.with_timezone(&tz).date_naive();

    if !shift.enabled() {
        return match local_instant(tz, today, ShiftTime::MIDNIGHT) {
            Some(midnight) => millis_between(midnight, now),
            None => 0,
        };
    }

    let (Some(shift_start), Some(shift_end)) = (
        local_instant(tz, today, shift.start()),
        local_instant(tz, today, shift.end()),
    ) else {
        debug!(%today, "shift boundary falls in a DST gap; reporting no elapsed time");
        return 0;
    };

    if now < shift_start {
        return 0;
    }
    if shift.start() < shift.end() && now > shift_end {
        return millis_between(shift_start, shift_end);
    }
    millis_between(shift_start, now)
}

/// Local calendar date of `now` in the shift's timezone.
pub fn shift_date(shift: &ShiftWindow, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&shift.tz()).date_naive()
}

/// Whether the external daily counter reset should run at `now`.
///
/// `false` when shift checking is disabled or when `last_reset` is already
/// today's local date; `true` once today's shift has opened.
pub fn is_daily_reset_due(
    shift: &ShiftWindow,
    last_reset: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> bool {
    if !shift.enabled() {
        return false;
    }
    let today = shift_date(shift, now);
    if last_reset == Some(today) {
        return false;
    }
    local_instant(shift.tz(), today, shift.start()).is_some_and(|opening| now >= opening)
}

/// The UTC instant of wall-clock `time` on `date` in `tz`.
///
/// Ambiguous local times resolve to the earlier instant; times skipped by a
/// DST jump yield `None`.
pub fn local_instant(tz: Tz, date: NaiveDate, time: ShiftTime) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(time.hour(), time.minute(), 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_milliseconds().max(0) as u64
}

// ── Tests ──────────────────────────────────────────────────────────────────────
