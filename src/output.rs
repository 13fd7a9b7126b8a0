//! Rendering of wide frames for files and logs.
//!
//! The pipeline itself is agnostic to presentation; this module writes
//! whole frames as CSV, appends one-row-per-sample snapshots for the watch
//! loop, and pretty-prints JSON for ad-hoc inspection. Timestamps render as
//! RFC 3339 UTC.

use anyhow::Result;
use csv::WriterBuilder;
use serde_json::json;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

use crate::frame::WideFrame;

fn header(frame: &WideFrame) -> Vec<String> {
    let mut row = vec!["timestamp".to_string()];
    row.extend(frame.columns().iter().cloned());
    row
}

fn record(frame: &WideFrame, row: usize) -> Vec<String> {
    let mut out = vec![frame.index()[row].to_rfc3339()];
    for col in 0..frame.n_cols() {
        out.push(match frame.get(row, col) {
            Some(v) => format!("{v:.2}"),
            None => String::new(),
        });
    }
    out
}

/// Writes the whole frame to `path` as CSV, replacing any existing file.
/// Empty cells render as empty fields.
pub fn write_csv(path: &str, frame: &WideFrame) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    writer.write_record(header(frame))?;
    for row in 0..frame.n_rows() {
        writer.write_record(record(frame, row))?;
    }
    writer.flush()?;

    info!(path, rows = frame.n_rows(), cols = frame.n_cols(), "Frame written");
    Ok(())
}

/// Appends the frame's newest row to `path`, writing the header only when
/// the file does not exist yet. The column set is assumed stable between
/// appends to the same file; a changed set warrants a fresh file.
pub fn append_latest(path: &str, frame: &WideFrame) -> Result<()> {
    if frame.is_empty() {
        debug!(path, "Nothing to append, frame has no rows");
        return Ok(());
    }

    let file_exists = Path::new(path).exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if !file_exists {
        writer.write_record(header(frame))?;
    }
    writer.write_record(record(frame, frame.n_rows() - 1))?;
    writer.flush()?;

    Ok(())
}

/// Logs the frame as pretty-printed JSON.
pub fn print_json(frame: &WideFrame) -> Result<()> {
    let rows: Vec<Vec<Option<f64>>> = (0..frame.n_rows())
        .map(|row| (0..frame.n_cols()).map(|col| frame.get(row, col)).collect())
        .collect();

    let value = json!({
        "index": frame.index().iter().map(|t| t.to_rfc3339()).collect::<Vec<_>>(),
        "columns": frame.columns(),
        "rows": rows,
    });
    info!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
