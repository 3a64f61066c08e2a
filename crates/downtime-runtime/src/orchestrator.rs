//! Async monitoring orchestrator.
//!
//! Runs [`DataManager`], [`analyze_fleet`] and [`StatusMonitor`] in a tokio
//! task and sends a [`MonitoringData`] snapshot through an `mpsc` channel on
//! every tick. Each tick recomputes the whole report from scratch with a
//! fresh "now".

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use downtime_core::settings::Settings;
use downtime_data::analysis::{analyze_fleet, FleetReport};
use downtime_data::transitions::{AlertKind, TransitionEvent};
use tokio::sync::mpsc;
use tokio::time;

use crate::data_manager::{DataManager, DEFAULT_CACHE_TTL_SECS};
use crate::status_monitor::StatusMonitor;

// ── Public types ──────────────────────────────────────────────────────────────

/// One tick's worth of output for the presentation layer.
#[derive(Debug, Clone)]
pub struct MonitoringData {
    pub report: FleetReport,
    /// Status changes since the previous tick.
    pub transitions: Vec<TransitionEvent>,
    pub alert: Option<AlertKind>,
    pub reset_due: bool,
    /// The snapshot could not be re-read and `report` is built from the
    /// last good one.
    pub stale: bool,
}

// ── MonitoringOrchestrator ────────────────────────────────────────────────────

/// Background monitoring coordinator.
///
/// Call [`MonitoringOrchestrator::start`] to spawn the loop and receive a
/// channel endpoint for [`MonitoringData`] updates. The loop ends when the
/// receiver is dropped.
pub struct MonitoringOrchestrator {
    update_interval: Duration,
    data_path: PathBuf,
    /// Plant timezone: shift hours and naive timestamps are read in it.
    tz: Tz,
    /// Supplies the CLI shift overrides applied on top of each snapshot's
    /// work hours.
    settings: Settings,
}

impl MonitoringOrchestrator {
    pub fn new(settings: Settings, data_path: PathBuf, tz: Tz) -> Self {
        Self {
            update_interval: Duration::from_secs(u64::from(settings.refresh_rate.max(1))),
            data_path,
            tz,
            settings,
        }
    }

    /// Spawn the monitoring loop.
    pub fn start(self) -> (mpsc::Receiver<MonitoringData>, MonitoringHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.monitoring_loop(tx).await;
        });

        (rx, MonitoringHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn monitoring_loop(self, tx: mpsc::Sender<MonitoringData>) {
        let mut data_manager =
            DataManager::new(DEFAULT_CACHE_TTL_SECS, self.data_path.clone(), self.tz);
        let mut status_monitor = StatusMonitor::new();

        self.fetch_and_send(&mut data_manager, &mut status_monitor, &tx, true)
            .await;

        let mut interval = time::interval(self.update_interval);
        // The first tick fires immediately; the initial fetch already ran.
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("monitoring channel closed; exiting loop");
                break;
            }

            self.fetch_and_send(&mut data_manager, &mut status_monitor, &tx, false)
                .await;
        }
    }

    async fn fetch_and_send(
        &self,
        data_manager: &mut DataManager,
        status_monitor: &mut StatusMonitor,
        tx: &mpsc::Sender<MonitoringData>,
        force: bool,
    ) {
        let Some(snapshot) = data_manager.get_data(force).cloned() else {
            tracing::warn!(
                path = %data_manager.data_path().display(),
                "no fleet snapshot available; skipping tick"
            );
            return;
        };
        let stale = data_manager.last_error().is_some();

        let shift = match self.settings.shift_window(&snapshot.work_hours, self.tz) {
            Ok(shift) => shift,
            Err(e) => {
                tracing::warn!(error = %e, "invalid work hours; skipping tick");
                return;
            }
        };

        let now = Utc::now();
        let report = analyze_fleet(&snapshot, &shift, now);
        let status = status_monitor.update(&snapshot.machines, &shift, now);

        let data = MonitoringData {
            report,
            transitions: status.transitions,
            alert: status.alert,
            reset_due: status.reset_due,
            stale,
        };

        if let Err(e) = tx.send(data).await {
            tracing::debug!(error = %e, "failed to send monitoring snapshot; receiver dropped");
        }
    }
}

// ── MonitoringHandle ──────────────────────────────────────────────────────────

/// Handle to the background monitoring task.
pub struct MonitoringHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl MonitoringHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
