//! Status transitions between two consecutive fleet snapshots.

use std::collections::HashMap;

use downtime_core::models::{MachineId, MachineSnapshot, MachineStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub machine_id: MachineId,
    pub from: MachineStatus,
    pub to: MachineStatus,
}

impl TransitionEvent {
    pub fn is_stop(&self) -> bool {
        self.to == MachineStatus::Stopped
    }

    pub fn is_resume(&self) -> bool {
        self.to == MachineStatus::Running
    }
}

/// Which audible alert a batch of transitions calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Alarm,
    Resumed,
}

/// Compare `prev` with `curr` and report every machine whose status changed.
///
/// Machines present only in `curr` never produce a transition. Output
/// follows the order of `curr`.
pub fn detect_transitions(prev: &[MachineSnapshot], curr: &[MachineSnapshot]) -> Vec<TransitionEvent> {
    let previous: HashMap<MachineId, MachineStatus> =
        prev.iter().map(|m| (m.id, m.status)).collect();

    curr.iter()
        .filter_map(|m| {
            let from = *previous.get(&m.id)?;
            (from != m.status).then_some(TransitionEvent {
                machine_id: m.id,
                from,
                to: m.status,
            })
        })
        .collect()
}

/// A stop anywhere in the batch wins over any resume.
pub fn alert_for(transitions: &[TransitionEvent]) -> Option<AlertKind> {
    if transitions.iter().any(TransitionEvent::is_stop) {
        Some(AlertKind::Alarm)
    } else if transitions.iter().any(TransitionEvent::is_resume) {
        Some(AlertKind::Resumed)
    } else {
        None
    }
}
