//! Downtime interval reconstruction from the status log.
//!
//! Closed intervals (a STOPPED event later matched by a RUNNING event) carry
//! the raw wall-clock duration between the two events. The open interval of
//! a machine that is still stopped carries the shift-filtered live duration
//! from [`active_downtime_ms`]. Report totals depend on both rules, so they
//! must stay as they are.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use downtime_core::clock::active_downtime_ms;
use downtime_core::models::{
    DowntimeInterval, HistoryEvent, MachineId, MachineSnapshot, MachineStatus, UNKNOWN_REASON,
};
use downtime_core::shift::ShiftWindow;
use tracing::debug;

/// A STOPPED event still waiting for its RUNNING counterpart.
#[derive(Debug, Clone)]
struct OpenStop {
    start: DateTime<Utc>,
    reason: String,
}

// ── IntervalReconstructor ─────────────────────────────────────────────────────

/// Stateless helper that turns the transition log into downtime intervals.
pub struct IntervalReconstructor;

impl IntervalReconstructor {
    /// Reconstruct every closed interval in `events` plus one open interval
    /// per currently stopped machine, evaluated at `now`.
    ///
    /// The result is unordered; callers sort or group as needed.
    pub fn reconstruct(
        events: &[HistoryEvent],
        snapshots: &[MachineSnapshot],
        shift: &ShiftWindow,
        now: DateTime<Utc>,
    ) -> Vec<DowntimeInterval> {
        Self::reconstruct_since(events, snapshots, shift, now, None)
    }

    /// Same as [`reconstruct`](Self::reconstruct), ignoring events stamped
    /// before `since`.
    pub fn reconstruct_since(
        events: &[HistoryEvent],
        snapshots: &[MachineSnapshot],
        shift: &ShiftWindow,
        now: DateTime<Utc>,
        since: Option<DateTime<Utc>>,
    ) -> Vec<DowntimeInterval> {
        let mut ordered: Vec<&HistoryEvent> = events
            .iter()
            .filter(|e| since.map_or(true, |cutoff| e.timestamp >= cutoff))
            .collect();
        // Stable: events sharing a timestamp keep their log order.
        ordered.sort_by_key(|e| e.timestamp);

        let mut open_stops: HashMap<MachineId, OpenStop> = HashMap::new();
        let mut intervals: Vec<DowntimeInterval> = Vec::new();

        for event in ordered {
            match event.new_status {
                MachineStatus::Stopped => {
                    let reason = event
                        .reason
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_REASON.to_string());
                    // A repeated STOPPED without a RUNNING in between replaces
                    // the earlier one.
                    open_stops.insert(
                        event.machine_id,
                        OpenStop {
                            start: event.timestamp,
                            reason,
                        },
                    );
                }
                MachineStatus::Running => match open_stops.remove(&event.machine_id) {
                    Some(stop) => {
                        let duration_ms =
                            (event.timestamp - stop.start).num_milliseconds().max(0) as u64;
                        intervals.push(DowntimeInterval {
                            machine_id: event.machine_id,
                            reason: stop.reason,
                            start: stop.start,
                            end: event.timestamp,
                            duration_ms,
                            is_open: false,
                        });
                    }
                    None => {
                        debug!(
                            machine_id = event.machine_id,
                            event_id = %event.id,
                            "ignoring resume event without a matching stop"
                        );
                    }
                },
            }
        }

        for machine in snapshots.iter().filter(|m| m.is_stopped()) {
            let stop = match open_stops.remove(&machine.id) {
                Some(stop) => stop,
                None => match machine.last_updated {
                    Some(start) => OpenStop {
                        start,
                        reason: machine
                            .reason
                            .clone()
                            .unwrap_or_else(|| UNKNOWN_REASON.to_string()),
                    },
                    None => {
                        debug!(
                            machine_id = machine.id,
                            "stopped machine has neither a log entry nor lastUpdated"
                        );
                        continue;
                    }
                },
            };

            intervals.push(DowntimeInterval {
                machine_id: machine.id,
                reason: stop.reason,
                start: stop.start,
                end: now,
                duration_ms: active_downtime_ms(stop.start, shift, now),
                is_open: true,
            });
        }

        intervals
    }

    /// Intervals belonging to `machine_id`.
    pub fn for_machine(
        intervals: &[DowntimeInterval],
        machine_id: MachineId,
    ) -> impl Iterator<Item = &DowntimeInterval> {
        intervals.iter().filter(move |i| i.machine_id == machine_id)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
