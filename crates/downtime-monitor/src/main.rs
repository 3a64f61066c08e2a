mod bootstrap;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use downtime_core::settings::Settings;
use downtime_core::time_utils::resolve_timezone;
use downtime_data::analysis::analyze_fleet;
use downtime_data::reader::{load_fleet_data, resolve_snapshot_path};
use downtime_runtime::orchestrator::MonitoringOrchestrator;

use crate::report::{alert_line, status_line, ReportView};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Downtime Monitor v{} starting", env!("CARGO_PKG_VERSION"));

    let tz = resolve_timezone(&settings.timezone)?;
    let data_path = resolve_snapshot_path(settings.data_file.as_deref());
    tracing::info!(
        view = %settings.view,
        timezone = tz.name(),
        data_file = %data_path.display(),
        "configuration resolved"
    );

    match settings.view.as_str() {
        "report" => run_report(&settings, &data_path, tz)?,
        "watch" => run_watch(settings, data_path, tz).await,
        unknown => eprintln!("Unknown view mode: {}", unknown),
    }

    Ok(())
}

/// Load the snapshot once and print the full report.
fn run_report(settings: &Settings, data_path: &Path, tz: Tz) -> Result<()> {
    let data = load_fleet_data(data_path, tz)
        .with_context(|| format!("loading fleet snapshot {}", data_path.display()))?;
    let shift = settings
        .shift_window(&data.work_hours, tz)
        .context("resolving work hours")?;

    let report = analyze_fleet(&data, &shift, Utc::now());
    print!(
        "{}",
        ReportView {
            report: &report,
            shift: &shift,
        }
    );
    Ok(())
}

/// Print a status line per refresh until Ctrl+C.
async fn run_watch(settings: Settings, data_path: PathBuf, tz: Tz) {
    tracing::info!("Starting live monitoring...");

    let orchestrator = MonitoringOrchestrator::new(settings, data_path, tz);
    let (mut rx, handle) = orchestrator.start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(data) = msg else {
                    tracing::warn!("monitoring task stopped");
                    break;
                };
                println!("{}", status_line(&data, tz));
                if let Some(alert) = data.alert {
                    let line = alert_line(alert, &data.transitions, &data.report);
                    tracing::warn!(?alert, "{}", line);
                    println!("{line}");
                }
                if data.reset_due {
                    println!("Daily downtime counters are due for reset.");
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Ctrl+C received; shutting down monitoring task");
                break;
            }
        }
    }

    handle.abort();
}
