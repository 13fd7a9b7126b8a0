//! Abstraction over the readings data store.
//!
//! The store holds raw sensor readings joined against per-sensor metadata
//! (calibration bias, warning threshold). Everything downstream talks to it
//! through [`ReadingStore`], so tests and alternative backends can swap in
//! without touching the pipeline.

mod http;

pub use http::HttpStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The data store could not be reached or the query failed.
///
/// Deliberately the only error the store surface can produce: an empty
/// result set is a valid answer, not an error.
#[derive(Debug, Clone, Error)]
#[error("data store unavailable: {reason}")]
pub struct DataUnavailable {
    pub reason: String,
}

impl DataUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// One raw row from the readings/sensors join.
///
/// `location` is optional because real stores occasionally hand back rows
/// with the label missing; those are skipped (and counted) at fetch time
/// rather than failing the whole query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingRow {
    pub timestamp: DateTime<Utc>,
    pub location: Option<String>,
    pub value: f64,
    /// Per-sensor calibration offset, subtracted from `value` at fetch time.
    pub bias: Option<f64>,
    /// Configured warning threshold for this sensor, if any.
    pub warning_level: Option<f64>,
}

/// Query parameters for a readings fetch.
#[derive(Debug, Clone)]
pub struct ReadingQuery {
    pub owner: i64,
    /// Restrict to sensors in this zone; `None` means all sensors of `owner`.
    pub zone: Option<String>,
    /// Time lower bound, inclusive. Always a UTC instant.
    pub since: DateTime<Utc>,
}

/// A backend that can answer readings queries.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Returns all rows for `query.owner` (optionally restricted to
    /// `query.zone`) with `timestamp >= query.since`, in arbitrary order.
    async fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<ReadingRow>, DataUnavailable>;
}
