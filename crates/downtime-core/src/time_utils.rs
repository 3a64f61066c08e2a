use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{DowntimeError, Result};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly. Falls back to `"UTC"` if
/// detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a timezone setting to a [`Tz`].
///
/// `"auto"` resolves to the system timezone; anything else must be a valid
/// IANA identifier.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    let name = if name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        name.to_string()
    };
    name.parse::<Tz>()
        .map_err(|_| DowntimeError::InvalidConfig(format!("unknown timezone \"{name}\"")))
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse the timestamp shapes found in fleet exports into a UTC instant.
///
/// Accepts RFC 3339 (including the `Z` suffix) and naive ISO forms, which are
/// interpreted in `naive_tz`. Returns `None` for empty or unrecognised input.
pub fn parse_timestamp(s: &str, naive_tz: Tz) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const FMTS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in FMTS {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            if let Some(dt) = naive_tz.from_local_datetime(&naive).earliest() {
                return Some(dt.with_timezone(&Utc));
            }
        }
    }

    warn!("could not parse timestamp \"{}\"", s);
    None
}

/// Convert Unix epoch milliseconds into a UTC instant.
pub fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

// ── Display ───────────────────────────────────────────────────────────────────

/// Format `dt` as a wall-clock `"HH:MM:SS"` string in `tz`.
pub fn format_local_time(dt: &DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%H:%M:%S").to_string()
}

/// Format `dt` as `"YYYY-MM-DD HH:MM"` in `tz`.
pub fn format_local_datetime(dt: &DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_system_timezone_is_non_empty() {
        assert!(!get_system_timezone().is_empty());
    }

    #[test]
    fn test_resolve_timezone_explicit() {
        assert_eq!(
            resolve_timezone("America/Sao_Paulo").unwrap(),
            chrono_tz::America::Sao_Paulo
        );
        assert_eq!(resolve_timezone("UTC").unwrap(), Tz::UTC);
    }

    #[test]
    fn test_resolve_timezone_unknown_is_invalid_config() {
        assert!(matches!(
            resolve_timezone("Mars/Olympus_Mons"),
            Err(DowntimeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("Europe/Berlin"));
        assert!(!validate_timezone("Nowhere/City"));
    }

    #[test]
    fn test_parse_rfc3339_z_suffix() {
        let dt = parse_timestamp("2024-03-04T10:00:00.500Z", Tz::UTC).unwrap();
        assert_eq!(dt.timestamp_millis() % 1000, 500);
        assert_eq!(dt.to_rfc3339(), "2024-03-04T10:00:00.500+00:00");
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2024-03-04T07:00:00-03:00", Tz::UTC).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_uses_given_timezone() {
        let dt = parse_timestamp("2024-03-04 07:00:00", chrono_tz::America::Sao_Paulo).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("", Tz::UTC).is_none());
        assert!(parse_timestamp("not a date", Tz::UTC).is_none());
    }

    #[test]
    fn test_from_epoch_millis() {
        let dt = from_epoch_millis(1_709_546_400_000).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_format_local_time() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 4, 10, 5, 9).unwrap();
        assert_eq!(format_local_time(&dt, Tz::UTC), "10:05:09");
        assert_eq!(
            format_local_time(&dt, chrono_tz::America::Sao_Paulo),
            "07:05:09"
        );
        assert_eq!(format_local_datetime(&dt, Tz::UTC), "2024-03-04 10:05");
    }
}
