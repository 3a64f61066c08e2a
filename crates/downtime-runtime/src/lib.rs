//! Runtime layer for the downtime monitor.
//!
//! Owns the only mutable state of the system: the snapshot cache, the
//! previous tick's machine statuses and the date of the last daily reset.
//! Everything derived from a snapshot is recomputed each tick by
//! [`downtime_data::analysis::analyze_fleet`].

pub mod data_manager;
pub mod orchestrator;
pub mod status_monitor;

pub use downtime_core as core;
pub use downtime_data as data;
