//! Environment-backed configuration.
//!
//! Everything has a working default so the binary runs against a local
//! store with no setup; `.env` files are honored via dotenvy at startup.

use chrono::Duration;

use crate::pipeline::CleanOptions;

/// Lookback, resample cadence, and cache TTL for one dashboard view.
/// A cadence of zero means the view is served raw, without resampling.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub lookback: Duration,
    pub cadence: Duration,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the readings store endpoint.
    pub store_url: String,
    pub owner: i64,
    /// Upper bound on a single store query.
    pub store_timeout: std::time::Duration,

    pub rolling_window: usize,
    pub outlier_threshold: f64,
    pub fill_limit: usize,
    pub backfill_leading: bool,

    /// Window for warning evaluation.
    pub warning_window: Duration,
    /// Where to POST warnings; logs only when unset.
    pub webhook_url: Option<String>,

    /// Un-resampled pivot of the recent window.
    pub raw_view: ViewConfig,
    /// Long-lookback cleaned series for the history chart.
    pub chart_view: ViewConfig,
    /// Fine-cadence short window backing the "current temperature" readout.
    pub current_view: ViewConfig,
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            store_url: std::env::var("THERMO_STORE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            owner: env_i64("THERMO_OWNER", 1),
            store_timeout: std::time::Duration::from_secs(
                env_i64("THERMO_STORE_TIMEOUT_SECS", 10) as u64,
            ),
            rolling_window: env_i64("THERMO_ROLLING_WINDOW", 5) as usize,
            outlier_threshold: env_f64("THERMO_OUTLIER_THRESHOLD", 5.0),
            fill_limit: env_i64("THERMO_FILL_LIMIT", 1) as usize,
            backfill_leading: std::env::var("THERMO_BACKFILL_LEADING").is_ok(),
            warning_window: Duration::minutes(env_i64("THERMO_WARNING_WINDOW_MINUTES", 5)),
            webhook_url: std::env::var("THERMO_WEBHOOK_URL").ok(),
            raw_view: ViewConfig {
                lookback: Duration::hours(env_i64("THERMO_RAW_LOOKBACK_HOURS", 3)),
                cadence: Duration::zero(),
                ttl: Duration::seconds(env_i64("THERMO_RAW_TTL_SECS", 60)),
            },
            chart_view: ViewConfig {
                lookback: Duration::hours(env_i64("THERMO_CHART_LOOKBACK_HOURS", 24)),
                cadence: Duration::seconds(env_i64("THERMO_CHART_CADENCE_SECS", 60)),
                ttl: Duration::seconds(env_i64("THERMO_CHART_TTL_SECS", 60)),
            },
            current_view: ViewConfig {
                lookback: Duration::hours(env_i64("THERMO_CURRENT_LOOKBACK_HOURS", 3)),
                cadence: Duration::seconds(env_i64("THERMO_CURRENT_CADENCE_SECS", 10)),
                ttl: Duration::seconds(env_i64("THERMO_CURRENT_TTL_SECS", 10)),
            },
        }
    }

    /// Clean-stage options for a view with the given cadence.
    pub fn clean_options(&self, cadence: Duration) -> CleanOptions {
        CleanOptions {
            cadence,
            rolling_window: self.rolling_window,
            outlier_threshold: self.outlier_threshold,
            fill_limit: self.fill_limit,
            backfill_leading: self.backfill_leading,
        }
    }
}
