use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use chrono_tz::Tz;

use crate::models::ShiftConfig;
use crate::shift::ShiftWindow;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Shift-aware downtime monitoring for a production fleet
#[derive(Parser, Debug, Clone)]
#[command(
    name = "downtime-monitor",
    about = "Shift-aware downtime monitoring for a production fleet",
    version
)]
pub struct Settings {
    /// Fleet snapshot file (JSON export with machines, history and workHours)
    #[arg(long, env = "DOWNTIME_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// View mode
    #[arg(long, default_value = "report", value_parser = ["report", "watch"])]
    pub view: String,

    /// Plant timezone used for shift hours (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Refresh rate in seconds for the watch view (1-60)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub refresh_rate: u32,

    /// Override the shift opening time (HH:MM)
    #[arg(long)]
    pub shift_start: Option<String>,

    /// Override the shift closing time (HH:MM)
    #[arg(long)]
    pub shift_end: Option<String>,

    /// Count downtime around the clock, ignoring work hours
    #[arg(long)]
    pub no_shift: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.downtime-monitor/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_end: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".downtime-monitor").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path, creating parent directories
    /// if needed.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation. Accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. clap keys args by field name, not flag spelling.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate {
                settings.refresh_rate = v;
            }
        }
        if settings.data_file.is_none() {
            settings.data_file = last.data_file;
        }
        if !settings.no_shift {
            if settings.shift_start.is_none() {
                settings.shift_start = last.shift_start;
            }
            if settings.shift_end.is_none() {
                settings.shift_end = last.shift_end;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Apply the CLI shift overrides on top of the work hours read from the
    /// fleet snapshot.
    pub fn apply_shift_overrides(&self, base: &ShiftConfig) -> ShiftConfig {
        if self.no_shift {
            return ShiftConfig {
                enabled: false,
                ..base.clone()
            };
        }
        if self.shift_start.is_none() && self.shift_end.is_none() {
            return base.clone();
        }
        ShiftConfig {
            enabled: true,
            start: self.shift_start.clone().unwrap_or_else(|| base.start.clone()),
            end: self.shift_end.clone().unwrap_or_else(|| base.end.clone()),
        }
    }

    /// The effective [`ShiftWindow`] for `base` work hours, evaluated in `tz`.
    pub fn shift_window(&self, base: &ShiftConfig, tz: Tz) -> crate::Result<ShiftWindow> {
        ShiftWindow::from_config(&self.apply_shift_overrides(base), tz)
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_file: s.data_file.clone(),
            view: Some(s.view.clone()),
            timezone: Some(s.timezone.clone()),
            refresh_rate: Some(s.refresh_rate),
            shift_start: s.shift_start.clone(),
            shift_end: s.shift_end.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
