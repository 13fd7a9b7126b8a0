//! Reading fetch with bias correction.
//!
//! Pulls raw rows out of a [`ReadingStore`], applies per-sensor calibration,
//! and drops malformed rows. Window bounds are computed in UTC so the math
//! is immune to DST transitions; local time is a presentation concern only.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::store::{DataUnavailable, ReadingQuery, ReadingStore};

/// A single bias-corrected sensor reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub location: String,
    /// Raw value minus the sensor's calibration bias.
    pub value: f64,
    /// Warning threshold configured for the sensor, if any. Carried through
    /// for alert evaluation; the charting pipeline ignores it.
    pub warning_level: Option<f64>,
}

/// Fetches readings for `owner` no older than `lookback`, bias-corrected.
///
/// Rows with no location label or a non-finite value are skipped and
/// counted; a single bad sensor row must not blank the whole dashboard.
/// The store call is bounded by `timeout` and surfaces [`DataUnavailable`]
/// on expiry instead of hanging the caller. No retries here: staleness
/// handling belongs to the cache layer.
pub async fn fetch_readings(
    store: &dyn ReadingStore,
    owner: i64,
    lookback: Duration,
    zone: Option<&str>,
    timeout: std::time::Duration,
) -> Result<Vec<Reading>, DataUnavailable> {
    let since = Utc::now() - lookback;
    let query = ReadingQuery {
        owner,
        zone: zone.map(str::to_string),
        since,
    };

    let rows = tokio::time::timeout(timeout, store.query_readings(&query))
        .await
        .map_err(|_| DataUnavailable::new(format!("store query timed out after {timeout:?}")))??;

    let mut skipped = 0usize;
    let mut readings = Vec::with_capacity(rows.len());

    for row in rows {
        let location = match row.location {
            Some(l) if !l.is_empty() => l,
            _ => {
                skipped += 1;
                continue;
            }
        };
        if !row.value.is_finite() {
            skipped += 1;
            continue;
        }

        let bias = row.bias.unwrap_or(0.0);
        readings.push(Reading {
            timestamp: row.timestamp,
            location,
            value: row.value - bias,
            warning_level: row.warning_level,
        });
    }

    if skipped > 0 {
        warn!(skipped, owner, "Skipped malformed reading rows");
    }
    debug!(count = readings.len(), owner, ?zone, "Readings fetched");

    Ok(readings)
}
