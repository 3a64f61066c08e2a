//! Shift-aware downtime accounting for a fleet of production machines.
//!
//! Holds the pure domain layer: the machine and history-event models, the
//! [`shift::ShiftWindow`] membership predicate, the minute-resolution
//! [`clock`] that intersects a stoppage with the configured shift, plus the
//! error type, CLI settings and display helpers shared by the other crates.

pub mod clock;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod shift;
pub mod time_utils;

pub use error::{DowntimeError, Result};
