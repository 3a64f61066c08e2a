//! TTL-cached loader for the fleet snapshot.
//!
//! Wraps [`load_fleet_data`] with a short time-to-live cache and retry logic.
//! Only the raw [`FleetData`] is cached; derived views depend on "now" and
//! are recomputed by the caller on every tick. On a failed refresh the
//! previous snapshot is handed back so a transient write by the store does
//! not blank the display.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use chrono_tz::Tz;
use downtime_core::models::FleetData;
use downtime_data::reader::load_fleet_data;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default cache TTL in seconds; one refresh tick.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 1;

/// Maximum number of fetch attempts before falling back to stale data.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── DataManager ───────────────────────────────────────────────────────────────

/// TTL-cached wrapper around the snapshot reader.
///
/// # Example
/// ```no_run
/// use downtime_runtime::data_manager::DataManager;
///
/// let mut mgr = DataManager::new(1, "/var/lib/plant/fleet.json".into(), chrono_tz::Tz::UTC);
/// if let Some(data) = mgr.get_data(false) {
///     println!("machines: {}", data.machines.len());
/// }
/// ```
pub struct DataManager {
    cache_ttl: Duration,
    data_path: PathBuf,
    /// Zone used for timestamps written without an offset.
    naive_tz: Tz,
    cache: Option<FleetData>,
    cache_timestamp: Option<Instant>,
    last_error: Option<String>,
    last_successful_fetch: Option<Instant>,
}

impl DataManager {
    pub fn new(cache_ttl_secs: u64, data_path: PathBuf, naive_tz: Tz) -> Self {
        Self {
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            data_path,
            naive_tz,
            cache: None,
            cache_timestamp: None,
            last_error: None,
            last_successful_fetch: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the fleet snapshot, using the cache while it is still valid.
    ///
    /// `force_refresh` bypasses the cache. The read is retried up to
    /// [`MAX_RETRY_ATTEMPTS`] times with back-off (0 ms, 100 ms, 200 ms); if
    /// every attempt fails the previous snapshot, if any, is returned.
    pub fn get_data(&mut self, force_refresh: bool) -> Option<&FleetData> {
        if !force_refresh && self.is_cache_valid() {
            tracing::trace!("returning cached fleet snapshot");
            return self.cache.as_ref();
        }

        match self.fetch_with_retry() {
            Ok(data) => {
                tracing::debug!(
                    machines = data.machines.len(),
                    events = data.history.len(),
                    "fleet snapshot cache updated"
                );
                self.cache = Some(data);
                self.cache_timestamp = Some(Instant::now());
                self.last_successful_fetch = Some(Instant::now());
                self.last_error = None;
                self.cache.as_ref()
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot read failed; falling back to cached data");
                self.last_error = Some(e);
                self.cache.as_ref()
            }
        }
    }

    /// Discard the cache so the next [`get_data`](Self::get_data) reads the file.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Description of the last failed read, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time since the last successful read.
    pub fn since_last_success(&self) -> Option<Duration> {
        self.last_successful_fetch.map(|ts| ts.elapsed())
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    fn fetch_with_retry(&self) -> Result<FleetData, String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying snapshot read after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match load_fleet_data(&self.data_path, self.naive_tz) {
                Ok(data) => return Ok(data),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "snapshot read attempt failed");
                    last_err = e.to_string();
                }
            }
        }

        Err(last_err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
