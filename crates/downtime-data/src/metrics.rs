//! Per-machine downtime rollup.

use chrono::{DateTime, Utc};
use downtime_core::clock::live_downtime_ms;
use downtime_core::models::{DowntimeInterval, HistoryEvent, MachineMetrics, MachineSnapshot};
use downtime_core::shift::ShiftWindow;

use crate::intervals::IntervalReconstructor;

/// Builds one [`MachineMetrics`] row per machine.
///
/// `failure_count` comes from the reconstructed intervals while
/// `total_downtime_ms` comes from the machine's persisted counter plus the
/// live delta of its current stop. The counter survives log truncation, the
/// interval list does not.
pub struct FleetMetricsAggregator;

impl FleetMetricsAggregator {
    /// Reconstruct intervals from `events` and roll them up per machine.
    pub fn metrics(
        machines: &[MachineSnapshot],
        events: &[HistoryEvent],
        shift: &ShiftWindow,
        now: DateTime<Utc>,
    ) -> Vec<MachineMetrics> {
        let intervals = IntervalReconstructor::reconstruct(events, machines, shift, now);
        Self::from_intervals(machines, &intervals, shift, now)
    }

    /// Roll up already reconstructed intervals. Rows keep the order of
    /// `machines`.
    pub fn from_intervals(
        machines: &[MachineSnapshot],
        intervals: &[DowntimeInterval],
        shift: &ShiftWindow,
        now: DateTime<Utc>,
    ) -> Vec<MachineMetrics> {
        machines
            .iter()
            .map(|machine| MachineMetrics {
                machine_id: machine.id,
                machine_name: machine.name.clone(),
                total_downtime_ms: machine
                    .accumulated_downtime_ms
                    .saturating_add(live_downtime_ms(machine, shift, now)),
                failure_count: IntervalReconstructor::for_machine(intervals, machine.id).count(),
                last_reason: machine.reason.clone(),
                status: machine.status,
            })
            .collect()
    }

    /// The row with the largest total downtime. The first one wins a tie.
    pub fn worst(metrics: &[MachineMetrics]) -> Option<&MachineMetrics> {
        metrics.iter().fold(None, |best, row| match best {
            Some(b) if b.total_downtime_ms >= row.total_downtime_ms => Some(b),
            _ => Some(row),
        })
    }

    /// Fleet-wide total of `total_downtime_ms`.
    pub fn total_downtime_ms(metrics: &[MachineMetrics]) -> u64 {
        metrics.iter().map(|m| m.total_downtime_ms).sum()
    }
}
