//! Resampling, gap filling, and outlier rejection for wide frames.
//!
//! [`clean`] turns an irregular pivoted frame into a fixed-cadence,
//! outlier-filtered one ready for charting.

pub mod fill;
pub mod outlier;
pub mod resample;
pub mod stats;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::frame::WideFrame;

/// Tuning for [`clean`]. Defaults match the dashboard's observed behavior:
/// 60 s cadence, 5-bucket rolling window, 5-degree outlier threshold,
/// single-bucket gap fill.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub cadence: Duration,
    pub rolling_window: usize,
    pub outlier_threshold: f64,
    pub fill_limit: usize,
    /// Backward-fill leading empty buckets after forward fill, so the chart
    /// has no hole at service start.
    pub backfill_leading: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            cadence: Duration::seconds(60),
            rolling_window: 5,
            outlier_threshold: 5.0,
            fill_limit: 1,
            backfill_leading: false,
        }
    }
}

/// Produces a cleaned frame on a complete fixed-cadence grid over
/// `[start, end)`.
///
/// Stages run in a fixed order: resample to the grid (per-bucket median),
/// forward-fill short gaps, reject local outliers, then one more fill pass
/// so single cleared points do not leave holes. The second fill runs exactly
/// once; the filter is never iterated to a fixed point.
pub fn clean(
    wide: &WideFrame,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    opts: &CleanOptions,
) -> Result<WideFrame> {
    let mut frame = resample::to_grid(wide, start, end, opts.cadence)?;

    fill::fill_short_gaps(&mut frame, opts.fill_limit);
    if opts.backfill_leading {
        fill::backfill_leading(&mut frame);
    }

    outlier::reject(&mut frame, opts.rolling_window, opts.outlier_threshold);
    fill::fill_short_gaps(&mut frame, opts.fill_limit);

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Reading;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn reading(secs: i64, location: &str, value: f64) -> Reading {
        Reading {
            timestamp: ts(secs),
            location: location.to_string(),
            value,
            warning_level: None,
        }
    }

    fn column(frame: &WideFrame, col: usize) -> Vec<Option<f64>> {
        (0..frame.n_rows()).map(|row| frame.get(row, col)).collect()
    }

    #[test]
    fn test_spike_cleared_then_backfilled_from_prior_bucket() {
        let readings: Vec<Reading> = [70.0, 70.0, 71.0, 95.0, 70.0, 70.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| reading(60 * i as i64, "Kitchen", v))
            .collect();
        let wide = WideFrame::pivot(&readings);

        let cleaned = clean(&wide, ts(0), ts(360), &CleanOptions::default()).unwrap();

        assert_eq!(
            column(&cleaned, 0),
            vec![
                Some(70.0),
                Some(70.0),
                Some(71.0),
                Some(71.0),
                Some(70.0),
                Some(70.0)
            ]
        );
    }

    #[test]
    fn test_clean_runs_on_empty_frame() {
        let cleaned = clean(
            &WideFrame::pivot(&[]),
            ts(0),
            ts(300),
            &CleanOptions::default(),
        )
        .unwrap();

        assert_eq!(cleaned.n_rows(), 5);
        assert_eq!(cleaned.n_cols(), 0);
    }

    #[test]
    fn test_clean_repeated_runs_identical() {
        let readings = vec![
            reading(10, "A", 70.0),
            reading(75, "A", 71.0),
            reading(75, "B", 40.0),
            reading(200, "B", 41.0),
        ];
        let wide = WideFrame::pivot(&readings);
        let opts = CleanOptions::default();

        let first = clean(&wide, ts(0), ts(300), &opts).unwrap();
        let second = clean(&wide, ts(0), ts(300), &opts).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_no_columns_invented() {
        let readings = vec![reading(0, "OnlyOne", 70.0)];
        let wide = WideFrame::pivot(&readings);
        let cleaned = clean(&wide, ts(0), ts(120), &CleanOptions::default()).unwrap();

        assert_eq!(cleaned.columns(), &["OnlyOne".to_string()]);
    }

    #[test]
    fn test_short_window_degrades_to_partial_rolling_stats() {
        // Only two buckets, rolling window of five: the statistic uses
        // whatever history exists and nothing panics.
        let readings = vec![reading(0, "A", 70.0), reading(60, "A", 71.0)];
        let wide = WideFrame::pivot(&readings);
        let cleaned = clean(&wide, ts(0), ts(120), &CleanOptions::default()).unwrap();

        assert_eq!(column(&cleaned, 0), vec![Some(70.0), Some(71.0)]);
    }

    #[test]
    fn test_backfill_leading_option() {
        let readings = vec![reading(130, "A", 70.0)];
        let wide = WideFrame::pivot(&readings);
        let opts = CleanOptions {
            backfill_leading: true,
            ..Default::default()
        };
        let cleaned = clean(&wide, ts(0), ts(240), &opts).unwrap();

        assert_eq!(
            column(&cleaned, 0),
            vec![Some(70.0), Some(70.0), Some(70.0), Some(70.0)]
        );
    }
}
