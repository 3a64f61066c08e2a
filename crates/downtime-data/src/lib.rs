//! Ingestion boundary and analytics for the downtime monitor.
//!
//! Converts raw fleet exports into typed snapshots and events, reconstructs
//! downtime intervals from the status log, and builds the per-machine
//! metrics, causes ranking, period totals and insights consumed by the
//! runtime and the report views.

pub mod analysis;
pub mod boundary;
pub mod insights;
pub mod intervals;
pub mod metrics;
pub mod pareto;
pub mod reader;
pub mod totals;
pub mod transitions;

pub use downtime_core as core;
