// =============================================================================
// Pipeline — the two stages wired to their inputs and outputs
// =============================================================================
//
//   candle exports ──► IndicatorEngine ──► indicator report
//   indicator report ──► CrossoverEngine (chunk) ──► crossover report
//
// The crossover stage re-reads the indicator report so a long history can be
// scanned chunk by chunk across separate runs without recomputation.
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::indicators::IndicatorEngine;
use crate::market_data::load_candle_files;
use crate::report::{CrossoverReport, IndicatorReport};
use crate::scanner_config::ScannerConfig;
use crate::signals::{ActionableLedger, CrossoverEngine};

/// Load, merge and annotate the configured exports, then write the
/// indicator report.  Returns the number of annotated rows.
pub fn run_indicator_stage(config: &ScannerConfig) -> Result<usize> {
    let candles = load_candle_files(config.candle_files.as_slice());
    if candles.is_empty() {
        bail!("no candles loaded from {} export(s)", config.candle_files.len());
    }

    let engine = IndicatorEngine::new(config.indicators.clone())?;
    let annotated = engine
        .annotate(candles)
        .context("candle series rejected by the indicator engine")?;
    let rows = annotated.len();

    IndicatorReport::new(config.ticker.clone(), annotated).save(&config.indicator_output)?;
    info!(rows, path = %config.indicator_output, "indicator stage complete");
    Ok(rows)
}

/// Summary of one crossover-stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverRun {
    pub found: usize,
    pub total_actionable_rows: usize,
    pub next_row: usize,
}

/// Scan one chunk of the indicator report and merge the actionable rows into
/// the crossover report.
pub fn run_crossover_stage(config: &ScannerConfig) -> Result<CrossoverRun> {
    let series = IndicatorReport::load(&config.indicator_output)?;

    let appending = config.chunk.append && Path::new(&config.crossover_output).exists();
    let (mut ledger, resume_row) = if appending {
        let existing = CrossoverReport::load(&config.crossover_output)?;
        info!(
            existing = existing.data.len(),
            next_row = existing.next_row,
            "appending to existing crossover report"
        );
        let ledger = ActionableLedger::from_records(existing.data);
        if ledger.len() != existing.total_actionable_rows {
            warn!(
                stored = existing.total_actionable_rows,
                unique = ledger.len(),
                "existing crossover report held duplicate timestamps; collapsed"
            );
        }
        (ledger, existing.next_row)
    } else {
        (ActionableLedger::new(), 0)
    };

    let start_row = config.chunk.start_row.unwrap_or(resume_row);

    let engine = CrossoverEngine::new(&config.indicators, &config.crossovers)?;
    info!(
        comparisons = engine.comparisons().len(),
        rows = series.data.len(),
        start_row,
        "scanning indicator series"
    );
    let outcome = engine
        .scan(&series.data, start_row, config.chunk.chunk_size)
        .context("indicator series rejected by the crossover engine")?;

    let found = outcome.records.len();
    let outcome_rows = outcome.rows_scanned;
    let stats = ledger.merge(outcome.records);
    // The resume point never moves backwards when an earlier range is re-run.
    let next_row = outcome.next_row.max(resume_row);

    let report = CrossoverReport::new(series.ticker, ledger, next_row);
    report.save(&config.crossover_output)?;

    info!(
        found,
        scanned = outcome_rows,
        added = stats.added,
        replaced = stats.replaced,
        total = report.total_actionable_rows,
        next_row,
        remaining = series.data.len().saturating_sub(next_row),
        "crossover stage complete"
    );

    Ok(CrossoverRun {
        found,
        total_actionable_rows: report.total_actionable_rows,
        next_row,
    })
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    struct Workspace {
        dir: PathBuf,
    }

    impl Workspace {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir()
                .join(format!("crossover_scanner_{}_{name}", std::process::id()));
            std::fs::create_dir_all(&dir).unwrap();
            Self { dir }
        }

        fn path(&self, file: &str) -> String {
            self.dir.join(file).to_string_lossy().into_owned()
        }
    }

    impl Drop for Workspace {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    /// Two trading days of 15-minute bars with a dip and a rally so that
    /// SMA_5 and VWAP crossings occur.
    fn write_exports(ws: &Workspace) -> Vec<String> {
        let closes = [
            10.0, 10.0, 10.0, 10.0, 10.0, 9.0, 8.0, 8.0, 12.0, 13.0, 14.0, 9.0,
        ];
        let rows: Vec<serde_json::Value> = closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let (day, slot) = if i < 6 { (2, i) } else { (3, i - 6) };
                let minutes = 15 + 15 * slot;
                let (hour, minute) = (9 + minutes / 60, minutes % 60);
                let ts = format!("2024-01-0{day}T{hour:02}:{minute:02}:00+0530");
                json!([ts, c, c + 0.5, c - 0.5, c, 1000, 0])
            })
            .collect();

        let first = ws.path("part1.json");
        let second = ws.path("part2.json");
        // Overlap one row between the two exports.
        std::fs::write(&first, json!({"data": {"candles": rows[..7]}}).to_string()).unwrap();
        std::fs::write(&second, json!({"data": {"candles": rows[6..]}}).to_string()).unwrap();
        vec![first, second]
    }

    fn config(ws: &Workspace) -> ScannerConfig {
        ScannerConfig {
            candle_files: write_exports(ws),
            indicator_output: ws.path("indicators.json"),
            crossover_output: ws.path("crossovers.json"),
            ..ScannerConfig::default()
        }
    }

    #[test]
    fn end_to_end_writes_actionable_rows() {
        let ws = Workspace::new("e2e");
        let cfg = config(&ws);

        assert_eq!(run_indicator_stage(&cfg).unwrap(), 12);
        let run = run_crossover_stage(&cfg).unwrap();
        assert_eq!(run.next_row, 12);
        assert!(run.found > 0);
        assert_eq!(run.total_actionable_rows, run.found);

        let report = CrossoverReport::load(&cfg.crossover_output).unwrap();
        assert_eq!(report.ticker, "SILVERBEES");
        assert_eq!(report.total_actionable_rows, report.data.len());
        for record in &report.data {
            assert!(record.crossovers.is_actionable());
            assert_eq!(record.crossovers.len(), 31);
        }
    }

    #[test]
    fn chunked_resume_equals_single_pass_and_reruns_are_idempotent() {
        let ws = Workspace::new("chunks");
        let mut cfg = config(&ws);
        run_indicator_stage(&cfg).unwrap();

        let single = run_crossover_stage(&cfg).unwrap();
        let expected = std::fs::read_to_string(&cfg.crossover_output).unwrap();

        std::fs::remove_file(&cfg.crossover_output).unwrap();
        cfg.chunk = crate::scanner_config::ChunkParams {
            start_row: None,
            chunk_size: 5,
            append: true,
        };
        let mut last = run_crossover_stage(&cfg).unwrap();
        assert_eq!(last.next_row, 5);
        while last.next_row < 12 {
            last = run_crossover_stage(&cfg).unwrap();
        }
        assert_eq!(last.total_actionable_rows, single.total_actionable_rows);

        // Re-scanning an earlier range neither duplicates rows nor rewinds.
        cfg.chunk.start_row = Some(0);
        let rerun = run_crossover_stage(&cfg).unwrap();
        assert_eq!(rerun.total_actionable_rows, single.total_actionable_rows);
        assert_eq!(rerun.next_row, 12);

        assert_eq!(std::fs::read_to_string(&cfg.crossover_output).unwrap(), expected);
    }

    #[test]
    fn no_readable_exports_is_an_error() {
        let ws = Workspace::new("empty");
        let cfg = ScannerConfig {
            candle_files: vec![ws.path("missing.json")],
            indicator_output: ws.path("indicators.json"),
            ..ScannerConfig::default()
        };
        assert!(run_indicator_stage(&cfg).is_err());
    }
}
