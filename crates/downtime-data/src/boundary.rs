//! Raw-record boundary.
//!
//! Fleet exports come from a loosely typed store. Everything the core needs
//! is converted here, once, into [`MachineSnapshot`], [`HistoryEvent`] and
//! [`ShiftConfig`]. Defaulting rules:
//!
//! * malformed or negative `accumulatedDowntimeMs` → `0`
//! * unparseable `lastUpdated` → `None`
//! * missing `name` → `"Machine <id>"`
//! * reason cleared on running machines, `"Unknown"` on stopped ones without one
//! * missing `previousStatus` → the opposite of `newStatus`
//! * missing `workHours` → [`ShiftConfig::default`]
//!
//! Records without a usable id, status or (for events) timestamp are dropped
//! with a warning; the log is treated as a possibly incomplete fact stream.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, warn};

use downtime_core::error::{DowntimeError, Result};
use downtime_core::models::{
    FleetData, HistoryEvent, MachineId, MachineSnapshot, MachineStatus, ShiftConfig,
    UNKNOWN_REASON,
};
use downtime_core::time_utils::{from_epoch_millis, parse_timestamp};

// ── Public API ────────────────────────────────────────────────────────────────

/// Convert a raw export `{machines, history, workHours}` into [`FleetData`].
///
/// Naive timestamps (no offset) are interpreted in `naive_tz`.
///
/// Fails only when the document itself is not an object or when one of the
/// collections has the wrong JSON type.
pub fn parse_fleet_data(value: &Value, naive_tz: Tz) -> Result<FleetData> {
    let obj = value
        .as_object()
        .ok_or_else(|| DowntimeError::InvalidRecord("fleet export must be a JSON object".into()))?;

    let machines = match obj.get("machines") {
        None | Some(Value::Null) => {
            warn!("fleet export has no machines");
            Vec::new()
        }
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(idx, raw)| {
                let parsed = parse_machine(raw, naive_tz);
                if parsed.is_none() {
                    warn!(index = idx, "dropping malformed machine record");
                }
                parsed
            })
            .collect(),
        Some(_) => {
            return Err(DowntimeError::InvalidRecord(
                "field 'machines' must be an array".into(),
            ))
        }
    };

    let history = match obj.get("history") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(idx, raw)| {
                let parsed = parse_event(raw, idx, naive_tz);
                if parsed.is_none() {
                    warn!(index = idx, "dropping malformed history event");
                }
                parsed
            })
            .collect(),
        Some(_) => {
            return Err(DowntimeError::InvalidRecord(
                "field 'history' must be an array".into(),
            ))
        }
    };

    let work_hours = match obj.get("workHours") {
        None | Some(Value::Null) => {
            debug!("no workHours in export; using default shift");
            ShiftConfig::default()
        }
        Some(raw) => parse_shift_config(raw)?,
    };

    debug!(
        machines = machines.len(),
        events = history.len(),
        "fleet export parsed"
    );

    Ok(FleetData {
        machines,
        history,
        work_hours,
    })
}

/// Convert one raw machine record. Returns `None` when the id or status is
/// unusable.
pub fn parse_machine(raw: &Value, naive_tz: Tz) -> Option<MachineSnapshot> {
    let id = parse_machine_id(raw.get("id")?)?;
    let status = parse_status(raw.get("status")?)?;

    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Machine {id}"));

    let reason = match status {
        MachineStatus::Running => None,
        MachineStatus::Stopped => Some(
            parse_reason(raw.get("reason")).unwrap_or_else(|| {
                debug!(machine_id = id, "stopped machine without reason");
                UNKNOWN_REASON.to_string()
            }),
        ),
    };

    let last_updated = raw
        .get("lastUpdated")
        .and_then(|v| parse_instant(v, naive_tz));
    if last_updated.is_none() {
        debug!(machine_id = id, "machine has no parseable lastUpdated");
    }

    let accumulated_downtime_ms = raw
        .get("accumulatedDowntimeMs")
        .map(lenient_millis)
        .unwrap_or(0);

    Some(MachineSnapshot {
        id,
        name,
        status,
        reason,
        last_updated,
        accumulated_downtime_ms,
    })
}

/// Convert one raw history event. `index` names events without an `id`.
pub fn parse_event(raw: &Value, index: usize, naive_tz: Tz) -> Option<HistoryEvent> {
    let machine_id = parse_machine_id(raw.get("machineId")?)?;
    let new_status = parse_status(raw.get("newStatus")?)?;
    let timestamp = parse_instant(raw.get("timestamp")?, naive_tz)?;

    let previous_status = raw
        .get("previousStatus")
        .and_then(parse_status)
        .unwrap_or_else(|| new_status.opposite());

    let reason = match new_status {
        MachineStatus::Stopped => parse_reason(raw.get("reason")),
        MachineStatus::Running => None,
    };

    let id = match raw.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("event-{index}"),
    };

    Some(HistoryEvent {
        id,
        machine_id,
        previous_status,
        new_status,
        reason,
        timestamp,
    })
}

/// Convert a raw `workHours` object. `enabled` defaults to `true`; missing
/// times fall back to the default shift.
pub fn parse_shift_config(raw: &Value) -> Result<ShiftConfig> {
    let obj = raw
        .as_object()
        .ok_or_else(|| DowntimeError::InvalidConfig("workHours must be an object".into()))?;
    let defaults = ShiftConfig::default();

    let text = |key: &str, fallback: String| -> Result<String> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(fallback),
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(other) => Err(DowntimeError::InvalidConfig(format!(
                "workHours.{key} must be a string, got {other}"
            ))),
        }
    };

    Ok(ShiftConfig {
        enabled: obj.get("enabled").and_then(Value::as_bool).unwrap_or(true),
        start: text("start", defaults.start)?,
        end: text("end", defaults.end)?,
    })
}

/// Accepts `RUNNING` / `STOPPED` and the legacy `FUNCIONANDO` / `PARADA`
/// tokens, case-insensitively.
pub fn parse_status(value: &Value) -> Option<MachineStatus> {
    let s = value.as_str()?.trim();
    if s.eq_ignore_ascii_case("RUNNING") || s.eq_ignore_ascii_case("FUNCIONANDO") {
        Some(MachineStatus::Running)
    } else if s.eq_ignore_ascii_case("STOPPED") || s.eq_ignore_ascii_case("PARADA") {
        Some(MachineStatus::Stopped)
    } else {
        None
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_machine_id(value: &Value) -> Option<MachineId> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| MachineId::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_reason(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// RFC 3339 / naive ISO strings, or Unix epoch milliseconds.
fn parse_instant(value: &Value, naive_tz: Tz) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s, naive_tz),
        Value::Number(n) => {
            if let Some(ms) = n.as_i64() {
                from_epoch_millis(ms)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .and_then(|f| from_epoch_millis(f.trunc() as i64))
            }
        }
        _ => None,
    }
}

/// Non-negative millisecond counter; anything else is `0`.
fn lenient_millis(value: &Value) -> u64 {
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| f as u64),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        debug!(raw = %value, "treating malformed accumulatedDowntimeMs as 0");
        0
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    // ── parse_machine ─────────────────────────────────────────────────────────

    #[test]
    fn test_parse_machine_full_record() {
        let raw = json!({
            "id": 4,
            "name": "Injector 4",
            "status": "PARADA",
            "reason": "Manutenção",
            "lastUpdated": "2024-03-04T10:00:00.000Z",
            "accumulatedDowntimeMs": 120000
        });
        let m = parse_machine(&raw, Tz::UTC).unwrap();
        assert_eq!(m.id, 4);
        assert_eq!(m.name, "Injector 4");
        assert_eq!(m.status, MachineStatus::Stopped);
        assert_eq!(m.reason.as_deref(), Some("Manutenção"));
        assert_eq!(m.last_updated, Some(ts(10, 0)));
        assert_eq!(m.accumulated_downtime_ms, 120_000);
    }

    #[test]
    fn test_parse_machine_defaults_missing_counter_and_name() {
        let raw = json!({"id": 7, "status": "RUNNING", "lastUpdated": "2024-03-04T08:00:00Z"});
        let m = parse_machine(&raw, Tz::UTC).unwrap();
        assert_eq!(m.name, "Machine 7");
        assert_eq!(m.accumulated_downtime_ms, 0);
    }

    #[test]
    fn test_parse_machine_malformed_counter_is_zero() {
        for bad in [json!(-500), json!("abc"), json!(null), json!({"x": 1})] {
            let raw = json!({"id": 1, "status": "RUNNING", "accumulatedDowntimeMs": bad});
            assert_eq!(parse_machine(&raw, Tz::UTC).unwrap().accumulated_downtime_ms, 0);
        }
    }

    #[test]
    fn test_parse_machine_float_counter_truncated() {
        let raw = json!({"id": 1, "status": "RUNNING", "accumulatedDowntimeMs": 1500.9});
        assert_eq!(parse_machine(&raw, Tz::UTC).unwrap().accumulated_downtime_ms, 1500);
    }

    #[test]
    fn test_parse_machine_reason_invariant() {
        let running = json!({"id": 1, "status": "FUNCIONANDO", "reason": "Stale"});
        assert!(parse_machine(&running, Tz::UTC).unwrap().reason.is_none());

        let stopped = json!({"id": 2, "status": "STOPPED", "reason": null});
        assert_eq!(
            parse_machine(&stopped, Tz::UTC).unwrap().reason.as_deref(),
            Some(UNKNOWN_REASON)
        );
    }

    #[test]
    fn test_parse_machine_bad_timestamp_is_none() {
        let raw = json!({"id": 1, "status": "STOPPED", "lastUpdated": "soon"});
        assert!(parse_machine(&raw, Tz::UTC).unwrap().last_updated.is_none());
    }

    #[test]
    fn test_parse_machine_rejects_missing_id_or_status() {
        assert!(parse_machine(&json!({"status": "RUNNING"}), Tz::UTC).is_none());
        assert!(parse_machine(&json!({"id": 1, "status": "IDLE"}), Tz::UTC).is_none());
        assert!(parse_machine(&json!({"id": -1, "status": "RUNNING"}), Tz::UTC).is_none());
    }

    #[test]
    fn test_parse_machine_string_id() {
        let m = parse_machine(&json!({"id": "12", "status": "running"}), Tz::UTC).unwrap();
        assert_eq!(m.id, 12);
        assert_eq!(m.status, MachineStatus::Running);
    }

    // ── parse_event ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_event_full_record() {
        let raw = json!({
            "id": "abc",
            "machineId": 3,
            "previousStatus": "FUNCIONANDO",
            "newStatus": "PARADA",
            "reason": "Falta de tapete",
            "timestamp": "2024-03-04T09:15:00Z"
        });
        let e = parse_event(&raw, 0, Tz::UTC).unwrap();
        assert_eq!(e.id, "abc");
        assert_eq!(e.machine_id, 3);
        assert_eq!(e.previous_status, MachineStatus::Running);
        assert_eq!(e.new_status, MachineStatus::Stopped);
        assert_eq!(e.reason.as_deref(), Some("Falta de tapete"));
        assert_eq!(e.timestamp, ts(9, 15));
    }

    #[test]
    fn test_parse_event_infers_previous_status_and_id() {
        let raw = json!({"machineId": 3, "newStatus": "RUNNING", "timestamp": 1709546400000i64});
        let e = parse_event(&raw, 9, Tz::UTC).unwrap();
        assert_eq!(e.previous_status, MachineStatus::Stopped);
        assert_eq!(e.id, "event-9");
        assert_eq!(e.timestamp, ts(10, 0));
    }

    #[test]
    fn test_parse_event_drops_reason_on_resume() {
        let raw = json!({"machineId": 3, "newStatus": "RUNNING", "reason": "x", "timestamp": "2024-03-04T10:00:00Z"});
        assert!(parse_event(&raw, 0, Tz::UTC).unwrap().reason.is_none());
    }

    #[test]
    fn test_parse_event_without_timestamp_is_dropped() {
        let raw = json!({"machineId": 3, "newStatus": "STOPPED", "timestamp": "never"});
        assert!(parse_event(&raw, 0, Tz::UTC).is_none());
    }

    // ── parse_shift_config ────────────────────────────────────────────────────

    #[test]
    fn test_parse_shift_config_full() {
        let cfg = parse_shift_config(&json!({"enabled": false, "start": "22:00", "end": "05:00"}))
            .unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.start, "22:00");
        assert_eq!(cfg.end, "05:00");
    }

    #[test]
    fn test_parse_shift_config_non_string_time_is_invalid() {
        assert!(matches!(
            parse_shift_config(&json!({"enabled": true, "start": 800, "end": "18:00"})),
            Err(DowntimeError::InvalidConfig(_))
        ));
    }

    // ── parse_fleet_data ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_fleet_data_skips_bad_records() {
        let raw = json!({
            "machines": [
                {"id": 1, "status": "RUNNING"},
                {"status": "RUNNING"},
                {"id": 2, "status": "STOPPED", "reason": "Manutenção"}
            ],
            "history": [
                {"machineId": 2, "newStatus": "STOPPED", "timestamp": "2024-03-04T09:00:00Z"},
                {"machineId": 2, "newStatus": "???", "timestamp": "2024-03-04T09:30:00Z"}
            ]
        });
        let data = parse_fleet_data(&raw, Tz::UTC).unwrap();
        assert_eq!(data.machines.len(), 2);
        assert_eq!(data.history.len(), 1);
        assert_eq!(data.work_hours, ShiftConfig::default());
    }

    #[test]
    fn test_parse_fleet_data_rejects_non_object() {
        assert!(matches!(
            parse_fleet_data(&json!([1, 2]), Tz::UTC),
            Err(DowntimeError::InvalidRecord(_))
        ));
        assert!(matches!(
            parse_fleet_data(&json!({"machines": "none"}), Tz::UTC),
            Err(DowntimeError::InvalidRecord(_))
        ));
    }
}
