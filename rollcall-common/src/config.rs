//! Engine configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Explicit override passed by the caller (highest priority)
//! 2. Environment variable (`ROLLCALL_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Compiled defaults
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 20;
const DEFAULT_TOLERANCE_MINUTES: i64 = 15;
const DEFAULT_TODAY_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_HISTORY_WINDOW_DAYS: i64 = 30;
const DEFAULT_STATS_WINDOW_DAYS: i64 = 30;

/// Resolved engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Remote attendance API base URL
    pub base_url: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Device geolocation acquisition timeout
    pub location_timeout: Duration,
    /// Grace period after scheduled start before lateness accrues
    pub tolerance_minutes: i64,
    /// Fixed interval for background polling of the today-shift view
    pub today_poll_interval: Duration,
    /// Width of the history query window, days back from today
    pub history_window_days: i64,
    /// Width of the stats query window, days back from today
    pub stats_window_days: i64,
}

/// Raw TOML file shape; every field optional so a partial file merges over
/// the defaults
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    location_timeout_secs: Option<u64>,
    tolerance_minutes: Option<i64>,
    today_poll_interval_secs: Option<u64>,
    history_window_days: Option<i64>,
    stats_window_days: Option<i64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            location_timeout: Duration::from_secs(DEFAULT_LOCATION_TIMEOUT_SECS),
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
            today_poll_interval: Duration::from_secs(DEFAULT_TODAY_POLL_INTERVAL_SECS),
            history_window_days: DEFAULT_HISTORY_WINDOW_DAYS,
            stats_window_days: DEFAULT_STATS_WINDOW_DAYS,
        }
    }
}

impl EngineConfig {
    /// Load configuration, merging file and environment over the defaults.
    ///
    /// `base_url_override` is the caller-supplied value (e.g. from a test
    /// harness or host application) and wins over everything else.
    pub fn load(base_url_override: Option<&str>, config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str::<ConfigFile>(&content)
                    .map_err(|e| Error::Config(format!("invalid config file: {e}")))?
            }
            None => ConfigFile::default(),
        };

        let defaults = EngineConfig::default();

        let base_url = base_url_override
            .map(str::to_string)
            .or_else(|| std::env::var("ROLLCALL_BASE_URL").ok())
            .or(file.base_url)
            .unwrap_or(defaults.base_url);

        let request_timeout = resolve_secs(
            "ROLLCALL_REQUEST_TIMEOUT_SECS",
            file.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        );
        let location_timeout = resolve_secs(
            "ROLLCALL_LOCATION_TIMEOUT_SECS",
            file.location_timeout_secs,
            DEFAULT_LOCATION_TIMEOUT_SECS,
        );
        let today_poll_interval = resolve_secs(
            "ROLLCALL_TODAY_POLL_INTERVAL_SECS",
            file.today_poll_interval_secs,
            DEFAULT_TODAY_POLL_INTERVAL_SECS,
        );

        let tolerance_minutes = resolve_i64(
            "ROLLCALL_TOLERANCE_MINUTES",
            file.tolerance_minutes,
            DEFAULT_TOLERANCE_MINUTES,
        );
        let history_window_days = resolve_i64(
            "ROLLCALL_HISTORY_WINDOW_DAYS",
            file.history_window_days,
            DEFAULT_HISTORY_WINDOW_DAYS,
        );
        let stats_window_days = resolve_i64(
            "ROLLCALL_STATS_WINDOW_DAYS",
            file.stats_window_days,
            DEFAULT_STATS_WINDOW_DAYS,
        );

        if tolerance_minutes < 0 {
            return Err(Error::Config(
                "tolerance_minutes must be non-negative".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            request_timeout,
            location_timeout,
            tolerance_minutes,
            today_poll_interval,
            history_window_days,
            stats_window_days,
        })
    }
}

// Unparseable environment values fall back rather than fail: log WARN, use
// the file value or compiled default, continue

fn resolve_secs(env_key: &str, file_value: Option<u64>, default: u64) -> Duration {
    let secs = match std::env::var(env_key) {
        Ok(text) => match text.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("{env_key} is not an integer ({text}), using default");
                file_value.unwrap_or(default)
            }
        },
        Err(_) => file_value.unwrap_or(default),
    };
    Duration::from_secs(secs)
}

fn resolve_i64(env_key: &str, file_value: Option<i64>, default: i64) -> i64 {
    match std::env::var(env_key) {
        Ok(text) => match text.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("{env_key} is not an integer ({text}), using default");
                file_value.unwrap_or(default)
            }
        },
        Err(_) => file_value.unwrap_or(default),
    }
}
