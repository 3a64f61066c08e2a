use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a machine in the fleet.
pub type MachineId = u32;

/// Cause recorded when a stoppage carries no reason.
pub const UNKNOWN_REASON: &str = "Unknown";

/// Operational state of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MachineStatus {
    /// The machine is producing.
    Running,
    /// The machine is halted; a cause is attached to the snapshot.
    Stopped,
}

impl MachineStatus {
    /// The other state. Used to infer a missing `previousStatus`.
    pub fn opposite(self) -> Self {
        match self {
            MachineStatus::Running => MachineStatus::Stopped,
            MachineStatus::Stopped => MachineStatus::Running,
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            MachineStatus::Running => "RUNNING",
            MachineStatus::Stopped => "STOPPED",
        })
    }
}

/// Daily work-shift window as stored alongside the fleet.
///
/// `start` and `end` are wall-clock `"HH:MM"` strings. When `start > end` the
/// shift wraps past midnight. Validation happens once, in
/// [`crate::shift::ShiftWindow::from_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftConfig {
    /// When `false` the shift spans all time (24/7).
    pub enabled: bool,
    /// Shift opening time, `"HH:MM"`.
    pub start: String,
    /// Shift closing time, `"HH:MM"`, inclusive.
    pub end: String,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start: "08:00".to_string(),
            end: "18:49".to_string(),
        }
    }
}

/// Current state of one machine, as last written by the status-update flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSnapshot {
    /// Unique machine identifier.
    pub id: MachineId,
    /// Display name.
    pub name: String,
    /// Running or stopped.
    pub status: MachineStatus,
    /// Stoppage cause; `Some` iff `status` is [`MachineStatus::Stopped`].
    #[serde(default)]
    pub reason: Option<String>,
    /// Instant of the last status change. `None` when the stored value was
    /// unparseable, in which case the live downtime counts as zero.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Closed-stoppage downtime since the last daily reset. Never includes
    /// the stoppage currently in progress.
    #[serde(default)]
    pub accumulated_downtime_ms: u64,
}

impl MachineSnapshot {
    /// Whether the machine is currently halted.
    pub fn is_stopped(&self) -> bool {
        self.status == MachineStatus::Stopped
    }
}

/// One entry of the append-only status-transition log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    pub id: String,
    pub machine_id: MachineId,
    pub previous_status: MachineStatus,
    pub new_status: MachineStatus,
    /// Set only when `new_status` is [`MachineStatus::Stopped`].
    #[serde(default)]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A consistent read of the fleet: snapshots, the transition log and the
/// configured work hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetData {
    pub machines: Vec<MachineSnapshot>,
    pub history: Vec<HistoryEvent>,
    pub work_hours: ShiftConfig,
}

/// A reconstructed stoppage span.
///
/// Closed intervals carry the raw wall-clock duration; the single open
/// interval of a machine carries the shift-filtered live duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DowntimeInterval {
    pub machine_id: MachineId,
    pub reason: String,
    pub start: DateTime<Utc>,
    /// Resume instant for closed intervals, the evaluation instant for open ones.
    pub end: DateTime<Utc>,
    pub duration_ms: u64,
    /// `true` while the machine is still stopped.
    pub is_open: bool,
}

/// Per-machine rollup shown in tables and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineMetrics {
    pub machine_id: MachineId,
    pub machine_name: String,
    /// Accumulated counter plus the live open-stop delta.
    pub total_downtime_ms: u64,
    /// Number of reconstructed intervals, closed and open.
    pub failure_count: usize,
    pub last_reason: Option<String>,
    pub status: MachineStatus,
}

/// One row of the causes ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoItem {
    pub reason: String,
    pub count: usize,
    pub duration_ms: u64,
    /// Share of the total duration, unrounded.
    pub percent: f64,
    /// Running share including this row, rounded after each step.
    pub accumulated_percent: u32,
}
