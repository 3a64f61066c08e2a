/// Format a millisecond duration as a live counter, `"HH:MM:SS"`.
///
/// Sub-second remainders are truncated; hours are not wrapped at 24.
///
/// # Examples
///
/// ```
/// use downtime_core::formatting::format_duration_hms;
///
/// assert_eq!(format_duration_hms(0), "00:00:00");
/// assert_eq!(format_duration_hms(3_723_999), "01:02:03");
/// assert_eq!(format_duration_hms(90_000_000), "25:00:00");
/// ```
pub fn format_duration_hms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a millisecond duration as fractional hours, e.g. `"1.5h"`.
///
/// # Examples
///
/// ```
/// use downtime_core::formatting::format_hours;
///
/// assert_eq!(format_hours(5_400_000, 1), "1.5h");
/// assert_eq!(format_hours(0, 1), "0.0h");
/// assert_eq!(format_hours(3_600_000, 0), "1h");
/// ```
pub fn format_hours(ms: u64, decimals: usize) -> String {
    let hours = ms as f64 / 3_600_000.0;
    format!("{:.prec$}h", hours, prec = decimals)
}

/// Format a millisecond duration in minutes as `"45m"`, `"3h"` or `"3h 45m"`.
///
/// # Examples
///
/// ```
/// use downtime_core::formatting::format_minutes;
///
/// assert_eq!(format_minutes(45 * 60_000), "45m");
/// assert_eq!(format_minutes(180 * 60_000), "3h");
/// assert_eq!(format_minutes(225 * 60_000), "3h 45m");
/// ```
pub fn format_minutes(ms: u64) -> String {
    let total_mins = (ms as f64 / 60_000.0).round() as u64;
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use downtime_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// Format a percentage with one decimal place and a `%` suffix.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
