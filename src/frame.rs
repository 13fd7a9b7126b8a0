//! Time-indexed wide table of sensor readings.
//!
//! One row per timestamp, one column per sensor location. The column set is
//! whatever the query returned; locations with no readings in the window
//! simply have no column, so downstream code must index by name.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::fetch::Reading;
use crate::pipeline::stats::median;

/// A table indexed by strictly increasing timestamps with one column per
/// location. Cells are `None` where a location has no reading at an instant.
#[derive(Debug, Clone, PartialEq)]
pub struct WideFrame {
    index: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    /// Row-major: `cells[row][col]`, aligned with `index` and `columns`.
    cells: Vec<Vec<Option<f64>>>,
}

impl WideFrame {
    /// Creates a frame with the given index and columns, all cells empty.
    pub fn with_grid(index: Vec<DateTime<Utc>>, columns: Vec<String>) -> Self {
        let cells = vec![vec![None; columns.len()]; index.len()];
        Self {
            index,
            columns,
            cells,
        }
    }

    /// Pivots a stream of readings into a wide frame.
    ///
    /// Rows group by exact timestamp, columns by location, both in sorted
    /// order so the result is identical regardless of input order. When the
    /// same (timestamp, location) pair occurs more than once the colliding
    /// values collapse to their median; never last-wins.
    pub fn pivot(readings: &[Reading]) -> Self {
        let mut grouped: BTreeMap<DateTime<Utc>, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
        let mut locations: BTreeSet<&str> = BTreeSet::new();

        for r in readings {
            locations.insert(&r.location);
            grouped
                .entry(r.timestamp)
                .or_default()
                .entry(&r.location)
                .or_default()
                .push(r.value);
        }

        let index: Vec<DateTime<Utc>> = grouped.keys().copied().collect();
        let columns: Vec<String> = locations.into_iter().map(str::to_string).collect();
        let mut frame = Self::with_grid(index, columns);

        for (row, by_location) in grouped.values().enumerate() {
            for (location, values) in by_location {
                if let Some(col) = frame.column_position(location) {
                    frame.set(row, col, median(values));
                }
            }
        }

        frame
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) {
        self.cells[row][col] = value;
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Latest non-empty value per column, scanning from the newest row.
    /// Columns that are empty over the whole frame are absent from the map.
    pub fn latest_per_column(&self) -> BTreeMap<String, f64> {
        let mut latest = BTreeMap::new();
        for (col, name) in self.columns.iter().enumerate() {
            for row in (0..self.n_rows()).rev() {
                if let Some(v) = self.get(row, col) {
                    latest.insert(name.clone(), v);
                    break;
                }
            }
        }
        latest
    }
}
