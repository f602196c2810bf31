// =============================================================================
// Candle Loader — merge broker exports into one chronological series
// =============================================================================
//
// Each export file holds a slice of history.  Files are read in the order
// given, rows are concatenated, and overlapping rows (the same timestamp in
// two adjacent exports) are collapsed to their first occurrence.
//
// A file that cannot be read is skipped with a warning so that one corrupt
// export never blocks the rest of the history.
// =============================================================================

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::candle::{parse_candle_row, Candle};

/// Read every export in `paths` (in order) and return the merged,
/// de-duplicated candle series.
pub fn load_candle_files<P: AsRef<Path>>(paths: &[P]) -> Vec<Candle> {
    let mut merged = Vec::new();

    for path in paths {
        let path = path.as_ref();
        match load_candle_file(path) {
            Ok(candles) => {
                info!(path = %path.display(), rows = candles.len(), "candle export loaded");
                merged.extend(candles);
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(path = %path.display(), error = %reason, "skipping unreadable candle export");
            }
        }
    }

    let before = merged.len();
    let candles = dedup_by_timestamp(merged);
    if candles.len() != before {
        info!(
            dropped = before - candles.len(),
            "dropped candles with duplicate timestamps"
        );
    }
    candles
}

/// Load a single export of the shape `{"data": {"candles": [...]}}`.
///
/// Rows that fail to parse are logged and skipped; the file itself only
/// fails when it cannot be read or lacks the candle array.
pub fn load_candle_file(path: &Path) -> Result<Vec<Candle>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let root: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let rows = root["data"]["candles"]
        .as_array()
        .context("missing array data.candles")?;

    let mut candles = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        match parse_candle_row(row) {
            Ok(candle) => candles.push(candle),
            Err(e) => warn!(
                path = %path.display(),
                row = idx,
                error = %e,
                "skipping malformed candle row"
            ),
        }
    }
    Ok(candles)
}

/// Keep the first candle seen for each timestamp, preserving input order.
pub fn dedup_by_timestamp(candles: Vec<Candle>) -> Vec<Candle> {
    let mut seen = HashSet::with_capacity(candles.len());
    candles
        .into_iter()
        .filter(|c| seen.insert(c.timestamp))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
