use anyhow::{Result, ensure};
use chrono::{DateTime, Duration, Utc};

use crate::frame::WideFrame;
use crate::pipeline::stats::median;

/// Resamples `wide` onto a fixed-cadence grid covering `[start, end)`.
///
/// Readings falling inside a bucket collapse to their median per column.
/// Buckets with no readings stay as fully-empty rows so the output index is
/// always a complete grid of `ceil(window / cadence)` rows, however sparse
/// the input. Readings outside the window are ignored.
pub fn to_grid(
    wide: &WideFrame,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    cadence: Duration,
) -> Result<WideFrame> {
    let cadence_ms = cadence.num_milliseconds();
    ensure!(cadence_ms > 0, "resample cadence must be at least 1ms");
    ensure!(end >= start, "window end precedes window start");

    let span_ms = (end - start).num_milliseconds();
    let n_buckets = (span_ms as u64).div_ceil(cadence_ms as u64) as usize;

    let index: Vec<DateTime<Utc>> = (0..n_buckets)
        .map(|i| start + cadence * i as i32)
        .collect();

    // Collect per-bucket, per-column samples before reducing.
    let n_cols = wide.n_cols();
    let mut samples: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); n_cols]; n_buckets];

    for (row, &ts) in wide.index().iter().enumerate() {
        let offset_ms = (ts - start).num_milliseconds();
        if offset_ms < 0 {
            continue;
        }
        let bucket = (offset_ms / cadence_ms) as usize;
        if bucket >= n_buckets {
            continue;
        }
        for col in 0..n_cols {
            if let Some(v) = wide.get(row, col) {
                samples[bucket][col].push(v);
            }
        }
    }

    let mut grid = WideFrame::with_grid(index, wide.columns().to_vec());
    for (bucket, cols) in samples.iter().enumerate() {
        for (col, values) in cols.iter().enumerate() {
            grid.set(bucket, col, median(values));
        }
    }

    Ok(grid)
}
