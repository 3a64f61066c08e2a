//! Short rule-based observations over the fleet rollup.

use std::fmt;

use downtime_core::formatting::format_hours;
use downtime_core::models::{MachineMetrics, MachineStatus, ParetoItem};

use crate::metrics::FleetMetricsAggregator;

/// A single observation, rendered through [`fmt::Display`].
#[derive(Debug, Clone, PartialEq)]
pub enum Insight {
    StoppedNow { count: usize },
    Bottleneck { machine_name: String, downtime_ms: u64 },
    TopCause { reason: String },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::StoppedNow { count } => {
                write!(f, "Attention: {count} machine(s) stopped right now.")
            }
            Insight::Bottleneck {
                machine_name,
                downtime_ms,
            } => write!(
                f,
                "Bottleneck: {machine_name} has the most downtime today ({}).",
                format_hours(*downtime_ms, 1)
            ),
            Insight::TopCause { reason } => {
                write!(f, "Top cause: \"{reason}\" accounts for most of the lost time.")
            }
        }
    }
}

pub struct InsightGenerator;

impl InsightGenerator {
    /// Up to three observations, in a fixed order: stopped count, worst
    /// machine, top cause. Each one is skipped when its condition is not met.
    pub fn generate(metrics: &[MachineMetrics], pareto: &[ParetoItem]) -> Vec<Insight> {
        let mut out = Vec::with_capacity(3);

        let stopped = metrics
            .iter()
            .filter(|m| m.status == MachineStatus::Stopped)
            .count();
        if stopped > 0 {
            out.push(Insight::StoppedNow { count: stopped });
        }

        if let Some(worst) = FleetMetricsAggregator::worst(metrics) {
            if worst.total_downtime_ms > 0 {
                out.push(Insight::Bottleneck {
                    machine_name: worst.machine_name.clone(),
                    downtime_ms: worst.total_downtime_ms,
                });
            }
        }

        if let Some(top) = pareto.first() {
            out.push(Insight::TopCause {
                reason: top.reason.clone(),
            });
        }

        out
    }

    /// [`generate`](Self::generate) rendered to plain strings.
    pub fn insights(metrics: &[MachineMetrics], pareto: &[ParetoItem]) -> Vec<String> {
        Self::generate(metrics, pareto)
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}
