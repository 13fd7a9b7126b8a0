use crate::frame::WideFrame;

/// Forward-fills short gaps, per column.
///
/// A run of consecutive empty buckets is filled from the value immediately
/// before it only when the run is no longer than `limit`; longer runs stay
/// empty. Leading runs have no prior value and are never touched here.
pub fn fill_short_gaps(frame: &mut WideFrame, limit: usize) {
    if limit == 0 {
        return;
    }

    let n_rows = frame.n_rows();
    for col in 0..frame.n_cols() {
        let mut row = 0;
        while row < n_rows {
            if frame.get(row, col).is_some() {
                row += 1;
                continue;
            }

            let run_start = row;
            while row < n_rows && frame.get(row, col).is_none() {
                row += 1;
            }
            let run_len = row - run_start;

            if run_start == 0 || run_len > limit {
                continue;
            }
            if let Some(v) = frame.get(run_start - 1, col) {
                for r in run_start..run_start + run_len {
                    frame.set(r, col, Some(v));
                }
            }
        }
    }
}

/// Backward-fills a leading empty run from the first value in the column.
///
/// Covers the service-start case where the very first buckets of the window
/// predate any reading; applied only when those buckets are still empty
/// after forward fill.
pub fn backfill_leading(frame: &mut WideFrame) {
    let n_rows = frame.n_rows();
    for col in 0..frame.n_cols() {
        let first_value = (0..n_rows).find_map(|row| frame.get(row, col).map(|v| (row, v)));
        if let Some((first_row, v)) = first_value {
            for row in 0..first_row {
                frame.set(row, col, Some(v));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn frame_from(values: &[Option<f64>]) -> WideFrame {
        let start: DateTime<Utc> = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let index = (0..values.len())
            .map(|i| start + Duration::seconds(60 * i as i64))
            .collect();
        let mut frame = WideFrame::with_grid(index, vec!["A".to_string()]);
        for (row, v) in values.iter().enumerate() {
            frame.set(row, 0, *v);
        }
        frame
    }

    fn column(frame: &WideFrame) -> Vec<Option<f64>> {
        (0..frame.n_rows()).map(|row| frame.get(row, 0)).collect()
    }

    #[test]
    fn test_single_gap_filled_from_prior_value() {
        let mut frame = frame_from(&[Some(70.0), None, Some(71.0)]);
        fill_short_gaps(&mut frame, 1);
        assert_eq!(column(&frame), vec![Some(70.0), Some(70.0), Some(71.0)]);
    }

    #[test]
    fn test_double_gap_left_empty() {
        let mut frame = frame_from(&[Some(70.0), None, None, Some(71.0)]);
        fill_short_gaps(&mut frame, 1);
        assert_eq!(
            column(&frame),
            vec![Some(70.0), None, None, Some(71.0)]
        );
    }

    #[test]
    fn test_trailing_single_gap_filled() {
        let mut frame = frame_from(&[Some(70.0), Some(71.0), None]);
        fill_short_gaps(&mut frame, 1);
        assert_eq!(column(&frame), vec![Some(70.0), Some(71.0), Some(71.0)]);
    }

    #[test]
    fn test_leading_gap_not_forward_filled() {
        let mut frame = frame_from(&[None, Some(70.0)]);
        fill_short_gaps(&mut frame, 1);
        assert_eq!(column(&frame), vec![None, Some(70.0)]);
    }

    #[test]
    fn test_limit_zero_is_a_no_op() {
        let mut frame = frame_from(&[Some(70.0), None, Some(71.0)]);
        fill_short_gaps(&mut frame, 0);
        assert_eq!(column(&frame), vec![Some(70.0), None, Some(71.0)]);
    }

    #[test]
    fn test_backfill_leading_run() {
        let mut frame = frame_from(&[None, None, Some(70.0), None]);
        backfill_leading(&mut frame);
        assert_eq!(
            column(&frame),
            vec![Some(70.0), Some(70.0), Some(70.0), None]
        );
    }

    #[test]
    fn test_backfill_all_empty_column_untouched() {
        let mut frame = frame_from(&[None, None]);
        backfill_leading(&mut frame);
        assert_eq!(column(&frame), vec![None, None]);
    }
}
