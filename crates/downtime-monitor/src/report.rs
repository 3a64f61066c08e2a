//! Plain-text rendering of fleet reports for the terminal.

use std::fmt;

use chrono_tz::Tz;
use downtime_core::formatting::{format_duration_hms, format_hours, format_percent};
use downtime_core::models::MachineStatus;
use downtime_core::shift::ShiftWindow;
use downtime_core::time_utils::{format_local_datetime, format_local_time};
use downtime_data::analysis::FleetReport;
use downtime_data::transitions::{AlertKind, TransitionEvent};
use downtime_runtime::orchestrator::MonitoringData;

const NAME_WIDTH: usize = 24;

/// Full report: machine table, cause ranking, period totals and insights.
pub struct ReportView<'a> {
    pub report: &'a FleetReport,
    pub shift: &'a ShiftWindow,
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        let tz = self.shift.tz();

        writeln!(
            f,
            "Fleet downtime report, {} ({})",
            format_local_datetime(&r.generated_at, tz),
            tz.name()
        )?;
        if self.shift.enabled() {
            writeln!(
                f,
                "Shift {}-{}, elapsed today {}",
                self.shift.start(),
                self.shift.end(),
                format_duration_hms(r.shift_elapsed_ms)
            )?;
        } else {
            writeln!(f, "Shift checking disabled; downtime counted around the clock")?;
        }
        writeln!(
            f,
            "Machines {}: running {}, stopped {}, operation rate {}",
            r.machine_count(),
            r.running_count,
            r.stopped_count,
            format_percent(r.operation_rate)
        )?;

        writeln!(f)?;
        writeln!(
            f,
            "{:<NAME_WIDTH$} {:<8} {:>10} {:>6}  LAST REASON",
            "MACHINE", "STATUS", "DOWNTIME", "STOPS"
        )?;
        for m in &r.metrics {
            writeln!(
                f,
                "{:<NAME_WIDTH$} {:<8} {:>10} {:>6}  {}",
                truncate(&m.machine_name, NAME_WIDTH),
                m.status,
                format_duration_hms(m.total_downtime_ms),
                m.failure_count,
                m.last_reason.as_deref().unwrap_or("-")
            )?;
        }

        writeln!(f)?;
        if r.pareto.is_empty() {
            writeln!(f, "No stoppages recorded.")?;
        } else {
            writeln!(
                f,
                "{:<NAME_WIDTH$} {:>6} {:>9} {:>7} {:>5}",
                "CAUSE", "COUNT", "DURATION", "SHARE", "CUM"
            )?;
            for item in &r.pareto {
                writeln!(
                    f,
                    "{:<NAME_WIDTH$} {:>6} {:>9} {:>7} {:>4}%",
                    truncate(&item.reason, NAME_WIDTH),
                    item.count,
                    format_hours(item.duration_ms, 1),
                    format_percent(item.percent),
                    item.accumulated_percent
                )?;
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Totals: today {}, this week {}, this month {}",
            format_hours(r.totals.daily_ms, 1),
            format_hours(r.totals.weekly_ms, 1),
            format_hours(r.totals.monthly_ms, 1)
        )?;

        if !r.insights.is_empty() {
            writeln!(f)?;
            for line in &r.insights {
                writeln!(f, "* {line}")?;
            }
        }
        Ok(())
    }
}

/// One line per watch tick.
pub fn status_line(data: &MonitoringData, tz: Tz) -> String {
    let r = &data.report;
    let stopped: Vec<String> = r
        .metrics
        .iter()
        .filter(|m| m.status == MachineStatus::Stopped)
        .map(|m| {
            let live = r
                .open_intervals()
                .find(|i| i.machine_id == m.machine_id)
                .map_or(0, |i| i.duration_ms);
            format!("{} {}", m.machine_name, format_duration_hms(live))
        })
        .collect();

    let mut line = format!(
        "[{}] running {}/{} ({}) today {}",
        format_local_time(&r.generated_at, tz),
        r.running_count,
        r.machine_count(),
        format_percent(r.operation_rate),
        format_hours(r.totals.daily_ms, 1)
    );
    if !stopped.is_empty() {
        line.push_str(" | stopped: ");
        line.push_str(&stopped.join(", "));
    }
    if data.stale {
        line.push_str(" (stale)");
    }
    line
}

/// Human-readable alert for a batch of transitions.
pub fn alert_line(alert: AlertKind, transitions: &[TransitionEvent], report: &FleetReport) -> String {
    let name = |id| {
        report
            .metrics
            .iter()
            .find(|m| m.machine_id == id)
            .map_or_else(|| format!("#{id}"), |m| m.machine_name.clone())
    };
    let (label, wanted) = match alert {
        AlertKind::Alarm => ("ALARM: stopped", MachineStatus::Stopped),
        AlertKind::Resumed => ("Resumed", MachineStatus::Running),
    };
    let names: Vec<String> = transitions
        .iter()
        .filter(|t| t.to == wanted)
        .map(|t| name(t.machine_id))
        .collect();
    format!("{label}: {}", names.join(", "))
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
