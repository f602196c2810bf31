// =============================================================================
// Scanner Configuration — declared parameters for both pipeline stages
// =============================================================================
//
// Every tunable lives here: input exports, output paths, the indicator set,
// the comparison thresholds and the chunk window.  All fields carry
// `#[serde(default)]` so that a partial file (or an older one) still loads.
//
// Environment variables override the chunk window and ticker so a caller can
// step through a long history without editing the file.
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indicators::IndicatorParams;
use crate::signals::CrossoverParams;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_ticker() -> String {
    "SILVERBEES".to_string()
}

fn default_indicator_output() -> String {
    "silver_full_indicators.json".to_string()
}

fn default_crossover_output() -> String {
    "silver_crossovers.json".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

// =============================================================================
// ChunkParams
// =============================================================================

/// Which slice of the annotated series the crossover stage scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkParams {
    /// First row to scan.  When absent and `append` is set, scanning resumes
    /// from the `next_row` recorded in the existing crossover report.
    #[serde(default)]
    pub start_row: Option<usize>,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Merge into the existing crossover report instead of replacing it.
    #[serde(default)]
    pub append: bool,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            start_row: None,
            chunk_size: default_chunk_size(),
            append: false,
        }
    }
}

// =============================================================================
// ScannerConfig
// =============================================================================

/// Top-level configuration of the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Instrument identifier carried through to both reports.
    #[serde(default = "default_ticker")]
    pub ticker: String,

    /// Broker exports, read in this order.
    #[serde(default)]
    pub candle_files: Vec<String>,

    #[serde(default = "default_indicator_output")]
    pub indicator_output: String,

    #[serde(default = "default_crossover_output")]
    pub crossover_output: String,

    // --- Stages -------------------------------------------------------------

    #[serde(default = "default_true")]
    pub run_indicators: bool,

    #[serde(default = "default_true")]
    pub run_crossovers: bool,

    // --- Parameters ---------------------------------------------------------

    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub crossovers: CrossoverParams,

    #[serde(default)]
    pub chunk: ChunkParams,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            ticker: default_ticker(),
            candle_files: Vec::new(),
            indicator_output: default_indicator_output(),
            crossover_output: default_crossover_output(),
            run_indicators: true,
            run_crossovers: true,
            indicators: IndicatorParams::default(),
            crossovers: CrossoverParams::default(),
            chunk: ChunkParams::default(),
        }
    }
}

impl ScannerConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scanner config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse scanner config from {}", path.display()))?;

        info!(
            path = %path.display(),
            ticker = %config.ticker,
            files = config.candle_files.len(),
            "scanner config loaded"
        );

        Ok(config)
    }

    /// Apply `SCANNER_*` overrides.  `lookup` is `std::env::var` in
    /// production; unparsable values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ticker) = lookup("SCANNER_TICKER") {
            let ticker = ticker.trim().to_uppercase();
            if !ticker.is_empty() {
                self.ticker = ticker;
            }
        }

        if let Some(raw) = lookup("SCANNER_START_ROW") {
            match raw.trim().parse::<usize>() {
                Ok(row) => self.chunk.start_row = Some(row),
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid SCANNER_START_ROW"),
            }
        }

        if let Some(raw) = lookup("SCANNER_CHUNK_SIZE") {
            match raw.trim().parse::<usize>() {
                Ok(size) => self.chunk.chunk_size = size,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid SCANNER_CHUNK_SIZE"),
            }
        }

        if let Some(raw) = lookup("SCANNER_APPEND") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.chunk.append = true,
                "0" | "false" | "no" => self.chunk.append = false,
                _ => warn!(value = %raw, "ignoring invalid SCANNER_APPEND"),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.indicators.validate().context("invalid indicator parameters")?;
        self.crossovers.validate().context("invalid crossover parameters")?;
        if self.chunk.chunk_size == 0 {
            bail!("chunk_size must be positive");
        }
        if self.run_indicators && self.candle_files.is_empty() {
            bail!("run_indicators is set but no candle_files are configured");
        }
        Ok(())
    }
}
