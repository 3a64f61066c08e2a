//! Work-shift membership.
//!
//! A [`ShiftWindow`] answers one question: is a given instant inside the
//! configured daily shift? Membership is decided at minute resolution on the
//! plant's wall clock, so seconds are ignored and both the opening and the
//! closing minute count as in-shift.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::{DowntimeError, Result};
use crate::models::ShiftConfig;

const MINUTES_PER_DAY: u16 = 24 * 60;

fn hhmm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("regex is valid"))
}

// ── ShiftTime ─────────────────────────────────────────────────────────────────

/// A wall-clock minute of the day in `[00:00, 23:59]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShiftTime(u16);

impl ShiftTime {
    /// `00:00`.
    pub const MIDNIGHT: ShiftTime = ShiftTime(0);

    /// Build from hour and minute. Returns `None` outside `[00:00, 23:59]`.
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self(hour * 60 + minute))
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0 % 60)
    }
}

impl FromStr for ShiftTime {
    type Err = DowntimeError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = hhmm_pattern()
            .captures(s.trim())
            .ok_or_else(|| DowntimeError::InvalidConfig(format!("shift time \"{s}\" is not HH:MM")))?;
        // Both groups are two ASCII digits, already range-checked by the pattern.
        let hour: u16 = caps[1]
            .parse()
            .map_err(|_| DowntimeError::InvalidConfig(format!("shift hour in \"{s}\"")))?;
        let minute: u16 = caps[2]
            .parse()
            .map_err(|_| DowntimeError::InvalidConfig(format!("shift minute in \"{s}\"")))?;
        Ok(Self(hour * 60 + minute))
    }
}

impl fmt::Display for ShiftTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

// ── ShiftWindow ───────────────────────────────────────────────────────────────

/// Validated shift configuration bound to the plant's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    enabled: bool,
    start: ShiftTime,
    end: ShiftTime,
    tz: Tz,
}

impl ShiftWindow {
    /// Validate `config` and bind it to `tz`.
    ///
    /// Shift times are only parsed when the shift is enabled; a disabled
    /// configuration is accepted whatever its strings contain.
    pub fn from_config(config: &ShiftConfig, tz: Tz) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::always(tz));
        }
        Ok(Self {
            enabled: true,
            start: config.start.parse()?,
            end: config.end.parse()?,
            tz,
        })
    }

    /// An enabled window between `start` and `end`.
    pub fn new(start: ShiftTime, end: ShiftTime, tz: Tz) -> Self {
        Self {
            enabled: true,
            start,
            end,
            tz,
        }
    }

    /// A window that covers all time (shift checking disabled).
    pub fn always(tz: Tz) -> Self {
        Self {
            enabled: false,
            start: ShiftTime(0),
            end: ShiftTime(MINUTES_PER_DAY - 1),
            tz,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn start(&self) -> ShiftTime {
        self.start
    }

    pub fn end(&self) -> ShiftTime {
        self.end
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// `true` for overnight shifts such as `22:00–05:00`.
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Wall-clock minute of the day of `instant` in the window's timezone.
    /// Seconds and sub-seconds are truncated.
    pub fn minute_of_day(&self, instant: DateTime<Utc>) -> u16 {
        let local = instant.with_timezone(&self.tz);
        // hour() < 24 and minute() < 60, so the product fits in u16.
        (local.hour() * 60 + local.minute()) as u16
    }

    /// Whether `instant` falls inside the shift. Both ends are inclusive.
    pub fn is_active(&self, instant: DateTime<Utc>) -> bool {
        if !self.enabled {
            return true;
        }
        let now = self.minute_of_day(instant);
        let (s, e) = (self.start.minutes(), self.end.minutes());
        if s <= e {
            s <= now && now <= e
        } else {
            now >= s || now <= e
        }
    }

    /// Config view of this window, for persistence and display.
    pub fn to_config(&self) -> ShiftConfig {
        ShiftConfig {
            enabled: self.enabled,
            start: self.start.to_string(),
            end: self.end.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, s).unwrap()
    }

    fn window(start: &str, end: &str) -> ShiftWindow {
        let cfg = ShiftConfig {
            enabled: true,
            start: start.to_string(),
            end: end.to_string(),
        };
        ShiftWindow::from_config(&cfg, Tz::UTC).unwrap()
    }

    // ── ShiftTime ────────────────────────────────────────────────────────────

    #[test]
    fn test_shift_time_parse_valid() {
        let t: ShiftTime = "18:49".parse().unwrap();
        assert_eq!(t.minutes(), 18 * 60 + 49);
        assert_eq!(t.to_string(), "18:49");
    }

    #[test]
    fn test_shift_time_parse_midnight_and_last_minute() {
        assert_eq!("00:00".parse::<ShiftTime>().unwrap().minutes(), 0);
        assert_eq!("23:59".parse::<ShiftTime>().unwrap().minutes(), 1439);
    }

    #[test]
    fn test_shift_time_rejects_malformed() {
        for bad in ["24:00", "8:00", "08:60", "0800", "", "ab:cd"] {
            let err = bad.parse::<ShiftTime>().unwrap_err();
            assert!(
                matches!(err, DowntimeError::InvalidConfig(_)),
                "{bad} should be InvalidConfig"
            );
        }
    }

    #[test]
    fn test_shift_time_from_hm_bounds() {
        assert!(ShiftTime::from_hm(23, 59).is_some());
        assert!(ShiftTime::from_hm(24, 0).is_none());
        assert!(ShiftTime::from_hm(0, 60).is_none());
    }

    // ── Day shift ────────────────────────────────────────────────────────────

    #[test]
    fn test_day_shift_boundaries_are_inclusive() {
        let w = window("08:00", "18:49");
        assert!(w.is_active(at(8, 0, 0)));
        assert!(w.is_active(at(18, 49, 0)));
        assert!(!w.is_active(at(7, 59, 0)));
        assert!(!w.is_active(at(18, 50, 0)));
    }

    #[test]
    fn test_seconds_are_ignored_for_membership() {
        let w = window("08:00", "18:49");
        assert!(w.is_active(at(18, 49, 59)));
        assert!(!w.is_active(at(7, 59, 59)));
    }

    // ── Overnight shift ──────────────────────────────────────────────────────

    #[test]
    fn test_overnight_shift_wraps_midnight() {
        let w = window("22:00", "05:00");
        assert!(w.wraps_midnight());
        assert!(w.is_active(at(23, 30, 0)));
        assert!(w.is_active(at(4, 59, 0)));
        assert!(w.is_active(at(0, 0, 0)));
        assert!(!w.is_active(at(12, 0, 0)));
        assert!(!w.is_active(at(5, 1, 0)));
    }

    // ── Disabled shift ───────────────────────────────────────────────────────

    #[test]
    fn test_disabled_shift_is_always_active() {
        let cfg = ShiftConfig {
            enabled: false,
            start: "garbage".to_string(),
            end: "".to_string(),
        };
        let w = ShiftWindow::from_config(&cfg, Tz::UTC).unwrap();
        assert!(!w.enabled());
        assert!(w.is_active(at(3, 0, 0)));
        assert!(w.is_active(at(23, 59, 59)));
    }

    #[test]
    fn test_enabled_shift_with_bad_time_is_invalid_config() {
        let cfg = ShiftConfig {
            enabled: true,
            start: "8h".to_string(),
            end: "18:00".to_string(),
        };
        assert!(matches!(
            ShiftWindow::from_config(&cfg, Tz::UTC),
            Err(DowntimeError::InvalidConfig(_))
        ));
    }

    // ── Timezone ─────────────────────────────────────────────────────────────

    #[test]
    fn test_membership_uses_window_timezone() {
        // 11:30 UTC is 08:30 in São Paulo (UTC-3, no DST in 2024).
        let cfg = ShiftConfig {
            enabled: true,
            start: "08:00".to_string(),
            end: "09:00".to_string(),
        };
        let w = ShiftWindow::from_config(&cfg, chrono_tz::America::Sao_Paulo).unwrap();
        assert!(w.is_active(at(11, 30, 0)));
        assert!(!w.is_active(at(8, 30, 0)));
        assert_eq!(w.minute_of_day(at(11, 30, 0)), 8 * 60 + 30);
    }

    #[test]
    fn test_to_config_round_trips_times() {
        let w = window("06:05", "14:30");
        let cfg = w.to_config();
        assert_eq!(cfg.start, "06:05");
        assert_eq!(cfg.end, "14:30");
        assert!(cfg.enabled);
    }
}
