// =============================================================================
// Persisted reports — indicator series and accumulated crossovers
// =============================================================================
//
// Both artifacts are pretty-printed JSON written with an atomic tmp + rename
// so a crash mid-write never leaves a truncated file behind for the next
// resumed run to choke on.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::AnnotatedCandle;
use crate::signals::{ActionableLedger, ActionableRecord};

pub const STATUS_SUCCESS: &str = "success";

/// Output of the indicator stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub status: String,
    pub ticker: String,
    pub data: Vec<AnnotatedCandle>,
}

impl IndicatorReport {
    pub fn new(ticker: impl Into<String>, data: Vec<AnnotatedCandle>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            ticker: ticker.into(),
            data,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json_atomic(path.as_ref(), self)
    }
}

/// Output of the crossover stage: every actionable row found so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossoverReport {
    pub status: String,
    pub ticker: String,
    pub total_actionable_rows: usize,

    /// First row of the indicator series not yet scanned.
    #[serde(default)]
    pub next_row: usize,

    pub data: Vec<ActionableRecord>,
}

impl CrossoverReport {
    pub fn new(ticker: impl Into<String>, ledger: ActionableLedger, next_row: usize) -> Self {
        let data = ledger.into_records();
        Self {
            status: STATUS_SUCCESS.to_string(),
            ticker: ticker.into(),
            total_actionable_rows: data.len(),
            next_row,
            data,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json_atomic(path.as_ref(), self)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Write `value` to `path` via a `.tmp` sibling and a rename.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content =
        serde_json::to_string_pretty(value).context("failed to serialise report to JSON")?;

    let tmp_path = path.with_extension("json.tmp");

    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write tmp report to {}", tmp_path.display()))?;

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename tmp report to {}", path.display()))?;

    info!(path = %path.display(), bytes = content.len(), "report saved (atomic)");
    Ok(())
}
