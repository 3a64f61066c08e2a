//! Tick-to-tick status tracking.
//!
//! [`StatusMonitor`] keeps the previous tick's machine list so that
//! [`detect_transitions`] can stay a pure function of two snapshots, and
//! remembers the local date of the last daily counter reset.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use downtime_core::clock::{is_daily_reset_due, shift_date};
use downtime_core::models::MachineSnapshot;
use downtime_core::shift::ShiftWindow;
use downtime_data::transitions::{alert_for, detect_transitions, AlertKind, TransitionEvent};

// ── Public types ──────────────────────────────────────────────────────────────

/// What changed since the previous call to [`StatusMonitor::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    pub transitions: Vec<TransitionEvent>,
    pub alert: Option<AlertKind>,
    /// The external daily counter reset should run now. Reported once per
    /// local day.
    pub reset_due: bool,
    /// Structural problems found in the snapshot. Not fatal.
    pub warnings: Vec<String>,
}

// ── StatusMonitor ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct StatusMonitor {
    previous: Vec<MachineSnapshot>,
    last_reset: Option<NaiveDate>,
    transition_count: usize,
}

impl StatusMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known reset date, e.g. one persisted by the store.
    pub fn with_last_reset(last_reset: Option<NaiveDate>) -> Self {
        Self {
            last_reset,
            ..Self::default()
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Diff `machines` against the previous call and check the reset schedule.
    ///
    /// The first call never reports transitions.
    pub fn update(
        &mut self,
        machines: &[MachineSnapshot],
        shift: &ShiftWindow,
        now: DateTime<Utc>,
    ) -> StatusUpdate {
        let warnings = Self::validate(machines);
        for warning in &warnings {
            tracing::debug!(%warning, "snapshot validation");
        }

        let transitions = detect_transitions(&self.previous, machines);
        for t in &transitions {
            tracing::info!(
                machine_id = t.machine_id,
                from = ?t.from,
                to = ?t.to,
                "machine status changed"
            );
        }
        self.transition_count += transitions.len();
        let alert = alert_for(&transitions);

        let reset_due = is_daily_reset_due(shift, self.last_reset, now);
        if reset_due {
            let today = shift_date(shift, now);
            tracing::info!(%today, "daily downtime counter reset due");
            self.last_reset = Some(today);
        }

        self.previous = machines.to_vec();

        StatusUpdate {
            transitions,
            alert,
            reset_due,
            warnings,
        }
    }

    /// Check a snapshot for duplicate ids and stopped machines without a
    /// usable `lastUpdated`.
    pub fn validate(machines: &[MachineSnapshot]) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (idx, machine) in machines.iter().enumerate() {
            if !seen.insert(machine.id) {
                errors.push(format!("machine[{idx}]: duplicate id {}", machine.id));
            }
            if machine.is_stopped() && machine.last_updated.is_none() {
                errors.push(format!(
                    "machine[{idx}]: stopped without a valid lastUpdated; live downtime is 0"
                ));
            }
        }

        errors
    }

    pub fn last_reset(&self) -> Option<NaiveDate> {
        self.last_reset
    }

    /// Total transitions observed since startup.
    pub fn transition_count(&self) -> usize {
        self.transition_count
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Tz;
    use downtime_core::models::{MachineStatus, ShiftConfig};

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn shift() -> ShiftWindow {
        ShiftWindow::from_config(&ShiftConfig::default(), Tz::UTC).unwrap()
    }

    fn m(id: u32, status: MachineStatus) -> MachineSnapshot {
        MachineSnapshot {
            id,
            name: format!("M{id}"),
            status,
            reason: None,
            last_updated: Some(at(4, 8, 0)),
            accumulated_downtime_ms: 0,
        }
    }

    #[test]
    fn test_first_update_has_no_transitions() {
        let mut monitor = StatusMonitor::new();
        let update = monitor.update(&[m(1, MachineStatus::Stopped)], &shift(), at(4, 9, 0));
        assert!(update.transitions.is_empty());
        assert_eq!(update.alert, None);
    }

    #[test]
    fn test_second_update_reports_changes() {
        let mut monitor = StatusMonitor::new();
        monitor.update(&[m(1, MachineStatus::Running)], &shift(), at(4, 9, 0));
        let update = monitor.update(&[m(1, MachineStatus::Stopped)], &shift(), at(4, 9, 1));
        assert_eq!(update.transitions.len(), 1);
        assert_eq!(update.alert, Some(AlertKind::Alarm));
        assert_eq!(monitor.transition_count(), 1);
    }

    #[test]
    fn test_reset_reported_once_per_day() {
        let mut monitor = StatusMonitor::new();
        let fleet = [m(1, MachineStatus::Running)];

        assert!(!monitor.update(&fleet, &shift(), at(4, 7, 0)).reset_due);
        assert!(monitor.update(&fleet, &shift(), at(4, 8, 0)).reset_due);
        assert!(!monitor.update(&fleet, &shift(), at(4, 12, 0)).reset_due);
        assert!(monitor.update(&fleet, &shift(), at(5, 8, 5)).reset_due);
        assert_eq!(
            monitor.last_reset(),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn test_known_reset_date_suppresses_signal() {
        let mut monitor = StatusMonitor::with_last_reset(NaiveDate::from_ymd_opt(2024, 3, 4));
        let update = monitor.update(&[m(1, MachineStatus::Running)], &shift(), at(4, 9, 0));
        assert!(!update.reset_due);
    }

    #[test]
    fn test_validate_flags_duplicates_and_missing_start() {
        let mut orphan = m(2, MachineStatus::Stopped);
        orphan.last_updated = None;
        let warnings = StatusMonitor::validate(&[m(1, MachineStatus::Running), m(1, MachineStatus::Running), orphan]);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("duplicate id 1"));
    }
}
