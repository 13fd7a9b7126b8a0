use tracing::debug;

use crate::frame::WideFrame;
use crate::pipeline::stats::median;

/// Clears cells that deviate too far from a local rolling median.
///
/// Per column, the rolling median spans the last `window` buckets (current
/// bucket included) of an unbounded forward-filled copy of the series, so a
/// short gap does not shrink the statistic. Partial windows are allowed down
/// to a single sample, and a window of 1 disables rejection outright: a
/// point is never its own outlier.
///
/// All deviations are measured against the pre-clear values, then the
/// flagged cells are cleared in one pass. This is a local spike detector:
/// a shift that persists past `window` buckets becomes the new median and
/// is accepted as a level change.
pub fn reject(frame: &mut WideFrame, window: usize, threshold: f64) -> usize {
    if window <= 1 {
        return 0;
    }

    let n_rows = frame.n_rows();
    let mut total_cleared = 0usize;

    for col in 0..frame.n_cols() {
        // Forward-filled snapshot for the rolling statistic only.
        let mut filled: Vec<Option<f64>> = Vec::with_capacity(n_rows);
        let mut last = None;
        for row in 0..n_rows {
            if let Some(v) = frame.get(row, col) {
                last = Some(v);
            }
            filled.push(last);
        }

        let mut flagged = Vec::new();
        for row in 0..n_rows {
            let Some(value) = frame.get(row, col) else {
                continue;
            };

            let lo = row + 1 - window.min(row + 1);
            let history: Vec<f64> = filled[lo..=row].iter().flatten().copied().collect();
            if let Some(local_median) = median(&history) {
                if (value - local_median).abs() > threshold {
                    flagged.push(row);
                }
            }
        }

        total_cleared += flagged.len();
        for row in flagged {
            frame.set(row, col, None);
        }
    }

    if total_cleared > 0 {
        debug!(cleared = total_cleared, window, threshold, "Outliers cleared");
    }
    total_cleared
}
