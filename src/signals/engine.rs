// =============================================================================
// Crossover Engine — scan an annotated series for actionable rows
// =============================================================================
//
// For every row i > 0 in the requested range, each comparison is evaluated
// against row i - 1 of the *full* series, never against the previous record
// that happened to be kept.  Rows where nothing fired are dropped.
//
// Ranges are half-open `[start, start + size)` clamped to the series, so a
// long history can be processed in chunks and resumed from `next_row`.
// =============================================================================

use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::comparison::{comparison_set, Comparison, CrossoverParams};
use super::crossover::SignalVector;
use crate::indicators::{AnnotatedCandle, IndicatorKind, IndicatorParams, IndicatorSnapshot};
use crate::market_data::candle::{ensure_chronological, format_timestamp, timestamp_format};

/// A row where at least one comparison fired, with the indicator values that
/// were compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionableRecord {
    #[serde(rename = "Timestamp", with = "timestamp_format")]
    pub timestamp: DateTime<FixedOffset>,
    #[serde(rename = "Close", default)]
    pub close: Option<f64>,
    #[serde(rename = "Volume", default)]
    pub volume: Option<f64>,
    #[serde(flatten)]
    pub indicators: IndicatorSnapshot,
    pub crossovers: SignalVector,
}

impl ActionableRecord {
    fn new(row: &AnnotatedCandle, crossovers: SignalVector) -> Self {
        Self {
            timestamp: row.candle.timestamp,
            close: row.candle.close,
            volume: row.candle.volume,
            indicators: row.indicators.clone(),
            crossovers,
        }
    }
}

/// Result of scanning one chunk.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// Actionable rows found in the chunk, in series order.
    pub records: Vec<ActionableRecord>,
    /// First row index not covered by this chunk.
    pub next_row: usize,
    pub rows_scanned: usize,
}

/// Evaluates the comparison set over an annotated series.
#[derive(Debug, Clone)]
pub struct CrossoverEngine {
    comparisons: Vec<Comparison>,
}

impl CrossoverEngine {
    pub fn new(indicators: &IndicatorParams, params: &CrossoverParams) -> Result<Self> {
        indicators.validate()?;
        params.validate()?;
        Ok(Self {
            comparisons: comparison_set(indicators, params),
        })
    }

    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// Scan rows `[start_row, start_row + chunk_size)` of `rows`.
    ///
    /// Fails when the series is not strictly increasing or does not carry an
    /// indicator column the comparison set needs.
    pub fn scan(
        &self,
        rows: &[AnnotatedCandle],
        start_row: usize,
        chunk_size: usize,
    ) -> Result<ChunkOutcome> {
        ensure_chronological(rows.iter().map(|r| &r.candle.timestamp))?;
        self.ensure_columns(rows)?;

        let end = rows.len().min(start_row.saturating_add(chunk_size));
        let begin = start_row.min(end);

        let mut records = Vec::new();
        // Row 0 has no predecessor and can never be actionable.
        for i in begin.max(1)..end {
            let (previous, current) = (&rows[i - 1], &rows[i]);

            let mut signals = SignalVector::with_capacity(self.comparisons.len());
            for cmp in &self.comparisons {
                signals.push(cmp.name.clone(), cmp.evaluate(current, previous));
            }

            if signals.is_actionable() {
                debug!(
                    row = i,
                    timestamp = %format_timestamp(&current.candle.timestamp),
                    fired = signals.fired().count(),
                    "actionable candle"
                );
                records.push(ActionableRecord::new(current, signals));
            }
        }

        info!(
            start_row = begin,
            next_row = end,
            actionable = records.len(),
            "crossover chunk scanned"
        );

        Ok(ChunkOutcome {
            records,
            next_row: end,
            rows_scanned: end - begin,
        })
    }

    /// Every indicator column referenced by a comparison must exist in the
    /// series, otherwise its comparisons would silently never fire.
    fn ensure_columns(&self, rows: &[AnnotatedCandle]) -> Result<()> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let mut required: Vec<IndicatorKind> = self
            .comparisons
            .iter()
            .flat_map(|c| [c.value.indicator(), c.reference.indicator()])
            .flatten()
            .collect();
        required.sort_unstable();
        required.dedup();

        for kind in required {
            if !first.indicators.contains(kind) {
                bail!(
                    "annotated series has no {kind} column; \
                     re-run the indicator stage with matching parameters"
                );
            }
        }
        Ok(())
    }
}
