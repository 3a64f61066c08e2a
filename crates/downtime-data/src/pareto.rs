//! Stoppage causes ranked by accumulated duration.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use downtime_core::models::{
    DowntimeInterval, HistoryEvent, MachineSnapshot, ParetoItem, UNKNOWN_REASON,
};
use downtime_core::shift::ShiftWindow;

use crate::intervals::IntervalReconstructor;

pub struct ParetoAnalyzer;

impl ParetoAnalyzer {
    /// Reconstruct intervals and rank their causes.
    pub fn pareto(
        machines: &[MachineSnapshot],
        events: &[HistoryEvent],
        shift: &ShiftWindow,
        now: DateTime<Utc>,
    ) -> Vec<ParetoItem> {
        let intervals = IntervalReconstructor::reconstruct(events, machines, shift, now);
        Self::from_intervals(&intervals)
    }

    /// Group `intervals` by reason and sort by total duration, descending.
    ///
    /// Equal durations keep the order in which their reason was first seen.
    /// `accumulated_percent` rounds the running sum at each step, so the last
    /// row can land one point away from 100.
    pub fn from_intervals(intervals: &[DowntimeInterval]) -> Vec<ParetoItem> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(String, usize, u64)> = Vec::new();

        for interval in intervals {
            let reason = if interval.reason.is_empty() {
                UNKNOWN_REASON
            } else {
                interval.reason.as_str()
            };
            match index.get(reason) {
                Some(&slot) => {
                    let group = &mut groups[slot];
                    group.1 += 1;
                    group.2 = group.2.saturating_add(interval.duration_ms);
                }
                None => {
                    index.insert(reason, groups.len());
                    groups.push((reason.to_string(), 1, interval.duration_ms));
                }
            }
        }

        // Stable sort keeps encounter order among ties.
        groups.sort_by(|a, b| b.2.cmp(&a.2));

        let total: u64 = groups.iter().map(|g| g.2).sum();
        let mut running = 0.0_f64;

        groups
            .into_iter()
            .map(|(reason, count, duration_ms)| {
                let percent = if total > 0 {
                    duration_ms as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                running += percent;
                ParetoItem {
                    reason,
                    count,
                    duration_ms,
                    percent,
                    accumulated_percent: running.round() as u32,
                }
            })
            .collect()
    }
}
