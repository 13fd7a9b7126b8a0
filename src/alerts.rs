//! Warning-threshold evaluation and notification hand-off.
//!
//! Reduces a short recent window of bias-corrected readings to one
//! representative value per location and compares it against the configured
//! warning threshold. Delivery is behind the [`Notifier`] trait; this module
//! only decides who is below threshold.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use serde::Serialize;
use tracing::{info, warn};

use crate::fetch::{Reading, fetch_readings};
use crate::pipeline::stats::median;
use crate::store::{DataUnavailable, ReadingStore};

/// Evaluated alert state for one location. Derived per call, not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningState {
    pub location: String,
    /// Median of the location's bias-corrected readings in the window.
    pub value: f64,
    /// Minimum configured threshold among the location's sensors.
    pub threshold: f64,
}

impl WarningState {
    pub fn in_warning(&self) -> bool {
        self.value < self.threshold
    }
}

/// Reduces readings to one [`WarningState`] per location.
///
/// Readings from sensors with no configured threshold are excluded
/// entirely, so they can never produce a false warning. Where several
/// sensors share a location label, the most conservative (minimum)
/// threshold wins.
pub fn evaluate(readings: &[Reading]) -> BTreeMap<String, WarningState> {
    let mut values: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    let mut thresholds: BTreeMap<&str, f64> = BTreeMap::new();

    for r in readings {
        let Some(level) = r.warning_level else {
            continue;
        };
        values.entry(&r.location).or_default().push(r.value);
        thresholds
            .entry(&r.location)
            .and_modify(|t| *t = t.min(level))
            .or_insert(level);
    }

    let mut states = BTreeMap::new();
    for (location, series) in values {
        let Some(value) = median(&series) else {
            continue;
        };
        states.insert(
            location.to_string(),
            WarningState {
                location: location.to_string(),
                value,
                threshold: thresholds[location],
            },
        );
    }
    states
}

/// Fetches the last `window` of readings for `owner` and evaluates
/// per-location warning state.
pub async fn check_warnings(
    store: &dyn ReadingStore,
    owner: i64,
    window: Duration,
    timeout: std::time::Duration,
) -> Result<BTreeMap<String, WarningState>, DataUnavailable> {
    let readings = fetch_readings(store, owner, window, None, timeout).await?;
    Ok(evaluate(&readings))
}

/// Collapses evaluated states to the `{location: value}` mapping handed to
/// the notification channel: only locations currently below threshold.
pub fn below_threshold(states: &BTreeMap<String, WarningState>) -> BTreeMap<String, f64> {
    states
        .values()
        .filter(|s| s.in_warning())
        .map(|s| (s.location.clone(), s.value))
        .collect()
}

/// Plain-text alert body, one `Location: value` line per warning.
pub fn format_warning_body(warnings: &BTreeMap<String, f64>) -> String {
    let mut body = String::new();
    for (location, value) in warnings {
        body.push_str(&format!("{location}: {value:.2}\n"));
    }
    body
}

/// Delivery channel for warnings. The channel owns formatting and transport;
/// the core only supplies the below-threshold mapping.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, warnings: &BTreeMap<String, f64>) -> Result<()>;
}

/// Fallback notifier that only logs; useful when no channel is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, warnings: &BTreeMap<String, f64>) -> Result<()> {
        warn!(count = warnings.len(), "Temperature warnings:\n{}", format_warning_body(warnings));
        Ok(())
    }
}

/// Posts the warning mapping as JSON to a configured webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, warnings: &BTreeMap<String, f64>) -> Result<()> {
        self.client
            .post(&self.url)
            .json(warnings)
            .send()
            .await?
            .error_for_status()?;
        info!(count = warnings.len(), "Warnings delivered to webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn reading(location: &str, value: f64, warning_level: Option<f64>) -> Reading {
        Reading {
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            location: location.to_string(),
            value,
            warning_level,
        }
    }

    #[test]
    fn test_median_value_compared_to_threshold() {
        let readings = vec![
            reading("A", 40.0, Some(45.0)),
            reading("A", 42.0, Some(45.0)),
        ];
        let states = evaluate(&readings);

        let a = &states["A"];
        assert_eq!(a.value, 41.0);
        assert_eq!(a.threshold, 45.0);
        assert!(a.in_warning());
    }

    #[test]
    fn test_sensor_without_threshold_excluded() {
        let readings = vec![reading("A", -100.0, None)];
        let states = evaluate(&readings);

        assert!(states.is_empty());
    }

    #[test]
    fn test_minimum_threshold_wins() {
        let readings = vec![
            reading("A", 50.0, Some(45.0)),
            reading("A", 50.0, Some(40.0)),
        ];
        let states = evaluate(&readings);

        assert_eq!(states["A"].threshold, 40.0);
        assert!(!states["A"].in_warning());
    }

    #[test]
    fn test_value_at_threshold_is_not_a_warning() {
        let readings = vec![reading("A", 45.0, Some(45.0))];
        let states = evaluate(&readings);

        assert!(!states["A"].in_warning());
    }

    #[test]
    fn test_below_threshold_mapping() {
        let readings = vec![
            reading("Cold", 40.0, Some(45.0)),
            reading("Fine", 70.0, Some(45.0)),
        ];
        let warnings = below_threshold(&evaluate(&readings));

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings.get("Cold"), Some(&40.0));
    }

    #[test]
    fn test_warning_body_format() {
        let mut warnings = BTreeMap::new();
        warnings.insert("Garage".to_string(), 41.236);
        warnings.insert("Porch".to_string(), 39.0);

        assert_eq!(format_warning_body(&warnings), "Garage: 41.24\nPorch: 39.00\n");
    }
}
