//! Full recompute of every derived view for one evaluation instant.
//!
//! [`analyze_fleet`] is the single entry point the runtime calls on each
//! refresh tick. It never reads the system clock; `now` is supplied by the
//! caller so that every figure in a [`FleetReport`] agrees with the others.

use chrono::{DateTime, Utc};
use downtime_core::clock::elapsed_shift_time_today;
use downtime_core::formatting::percentage;
use downtime_core::models::{DowntimeInterval, FleetData, MachineMetrics, ParetoItem};
use downtime_core::shift::ShiftWindow;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::insights::InsightGenerator;
use crate::intervals::IntervalReconstructor;
use crate::metrics::FleetMetricsAggregator;
use crate::pareto::ParetoAnalyzer;
use crate::totals::{time_totals, TimeTotals};

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything derived from one fleet snapshot at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetReport {
    pub generated_at: DateTime<Utc>,
    /// Closed and open intervals, ordered by start.
    pub intervals: Vec<DowntimeInterval>,
    /// One row per machine, in snapshot order.
    pub metrics: Vec<MachineMetrics>,
    pub pareto: Vec<ParetoItem>,
    pub insights: Vec<String>,
    pub totals: TimeTotals,
    /// Portion of today's shift already elapsed.
    pub shift_elapsed_ms: u64,
    pub stopped_count: usize,
    pub running_count: usize,
    /// Running machines as a percentage of the fleet, one decimal.
    pub operation_rate: f64,
}

impl FleetReport {
    pub fn machine_count(&self) -> usize {
        self.metrics.len()
    }

    pub fn open_intervals(&self) -> impl Iterator<Item = &DowntimeInterval> {
        self.intervals.iter().filter(|i| i.is_open)
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Recompute every view of `data` at `now`.
///
/// 1. Reconstruct downtime intervals.
/// 2. Roll them up per machine and per cause.
/// 3. Derive insights, period totals and shift progress.
pub fn analyze_fleet(data: &FleetData, shift: &ShiftWindow, now: DateTime<Utc>) -> FleetReport {
    let mut intervals =
        IntervalReconstructor::reconstruct(&data.history, &data.machines, shift, now);
    intervals.sort_by_key(|i| (i.start, i.machine_id));

    let metrics = FleetMetricsAggregator::from_intervals(&data.machines, &intervals, shift, now);
    let pareto = ParetoAnalyzer::from_intervals(&intervals);
    let insights = InsightGenerator::insights(&metrics, &pareto);
    let totals = time_totals(&intervals, shift.tz(), now);

    let stopped_count = data.machines.iter().filter(|m| m.is_stopped()).count();
    let running_count = data.machines.len() - stopped_count;
    let operation_rate = percentage(running_count as f64, data.machines.len() as f64, 1);

    debug!(
        machines = data.machines.len(),
        events = data.history.len(),
        intervals = intervals.len(),
        causes = pareto.len(),
        stopped = stopped_count,
        "fleet analysis complete"
    );

    FleetReport {
        generated_at: now,
        intervals,
        metrics,
        pareto,
        insights,
        totals,
        shift_elapsed_ms: elapsed_shift_time_today(shift, now),
        stopped_count,
        running_count,
        operation_rate,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Tz;
    use downtime_core::models::{HistoryEvent, MachineSnapshot, MachineStatus, ShiftConfig};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 13, h, m, 0).unwrap()
    }

    fn machine(
        id: u32,
        status: MachineStatus,
        reason: Option<&str>,
        t: DateTime<Utc>,
        acc: u64,
    ) -> MachineSnapshot {
        MachineSnapshot {
            id,
            name: format!("Injector {id}"),
            status,
            reason: reason.map(str::to_string),
            last_updated: Some(t),
            accumulated_downtime_ms: acc,
        }
    }

    fn event(
        id: &str,
        machine_id: u32,
        status: MachineStatus,
        reason: Option<&str>,
        t: DateTime<Utc>,
    ) -> HistoryEvent {
        HistoryEvent {
            id: id.to_string(),
            machine_id,
            previous_status: status.opposite(),
            new_status: status,
            reason: reason.map(str::to_string),
            timestamp: t,
        }
    }

    fn fleet() -> FleetData {
        FleetData {
            machines: vec![
                machine(1, MachineStatus::Running, None, at(9, 30), 1_800_000),
                machine(2, MachineStatus::Stopped, Some("Maintenance"), at(10, 0), 0),
                machine(3, MachineStatus::Running, None, at(8, 0), 0),
                machine(4, MachineStatus::Running, None, at(8, 0), 0),
            ],
            history: vec![
                event("e1", 1, MachineStatus::Stopped, Some("Material"), at(9, 0)),
                event("e2", 1, MachineStatus::Running, None, at(9, 30)),
                event("e3", 2, MachineStatus::Stopped, Some("Maintenance"), at(10, 0)),
            ],
            work_hours: ShiftConfig {
                enabled: true,
                start: "08:00".to_string(),
                end: "18:00".to_string(),
            },
        }
    }

    fn shift(data: &FleetData) -> ShiftWindow {
        ShiftWindow::from_config(&data.work_hours, Tz::UTC).unwrap()
    }

    #[test]
    fn test_analyze_fleet_end_to_end() {
        let data = fleet();
        let report = analyze_fleet(&data, &shift(&data), at(11, 0));

        assert_eq!(report.generated_at, at(11, 0));
        assert_eq!(report.intervals.len(), 2);
        assert_eq!(report.intervals[0].machine_id, 1);
        assert_eq!(report.open_intervals().count(), 1);

        assert_eq!(report.machine_count(), 4);
        assert_eq!(report.metrics[0].total_downtime_ms, 1_800_000);
        assert_eq!(report.metrics[1].total_downtime_ms, 3_600_000);

        // Maintenance (open, 1h) outranks Material (closed, 30m).
        assert_eq!(report.pareto[0].reason, "Maintenance");
        assert_eq!(report.pareto[1].reason, "Material");

        assert_eq!(report.totals.daily_ms, 5_400_000);
        assert_eq!(report.shift_elapsed_ms, 3 * 3_600_000);
        assert_eq!(report.stopped_count, 1);
        assert_eq!(report.running_count, 3);
        assert!((report.operation_rate - 75.0).abs() < 1e-9);
        assert_eq!(report.insights.len(), 3);
    }

    #[test]
    fn test_same_now_same_report() {
        let data = fleet();
        let s = shift(&data);
        assert_eq!(analyze_fleet(&data, &s, at(12, 0)), analyze_fleet(&data, &s, at(12, 0)));
    }

    #[test]
    fn test_empty_fleet() {
        let data = FleetData::default();
        let report = analyze_fleet(&data, &ShiftWindow::always(Tz::UTC), at(12, 0));
        assert!(report.intervals.is_empty());
        assert!(report.pareto.is_empty());
        assert!(report.insights.is_empty());
        assert_eq!(report.operation_rate, 0.0);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let data = fleet();
        let report = analyze_fleet(&data, &shift(&data), at(11, 0));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("shiftElapsedMs").is_some());
        assert!(json["totals"].get("dailyMs").is_some());
    }
}
