//! Fleet snapshot file loading.
//!
//! Reads the JSON export written by the plant's store
//! (`{timestamp?, machines, history, workHours, tvConfig?}`) and hands it to
//! the [`crate::boundary`] for typing and defaulting.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use downtime_core::error::{DowntimeError, Result};
use downtime_core::models::FleetData;
use tracing::debug;

use crate::boundary::parse_fleet_data;

/// File name used when no explicit snapshot path is configured.
pub const DEFAULT_SNAPSHOT_FILE: &str = "fleet.json";

/// Load and parse the fleet snapshot at `path`.
///
/// Naive timestamps inside the file are interpreted in `naive_tz`.
pub fn load_fleet_data(path: &Path, naive_tz: Tz) -> Result<FleetData> {
    if !path.exists() {
        return Err(DowntimeError::DataPathNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| DowntimeError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let value: serde_json::Value = serde_json::from_str(&content)?;
    let data = parse_fleet_data(&value, naive_tz)?;

    debug!(
        path = %path.display(),
        machines = data.machines.len(),
        events = data.history.len(),
        "fleet snapshot loaded"
    );

    Ok(data)
}

/// Resolve the snapshot path: `explicit` when given, otherwise
/// `~/.downtime-monitor/fleet.json`.
pub fn resolve_snapshot_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    default_data_dir().join(DEFAULT_SNAPSHOT_FILE)
}

/// `~/.downtime-monitor`, or `./.downtime-monitor` when the home directory is
/// unknown.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".downtime-monitor")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
