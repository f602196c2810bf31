// =============================================================================
// Crossover Scanner — Main Entry Point
// =============================================================================
//
// Batch run over one instrument's history: annotate the merged candle exports
// with indicators, then scan one chunk of the annotated series for crossovers
// and merge the actionable rows into the crossover report.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod indicators;
mod market_data;
mod pipeline;
mod report;
mod scanner_config;
mod signals;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scanner_config::ScannerConfig;

const DEFAULT_CONFIG_PATH: &str = "scanner_config.json";

fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("SCANNER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = ScannerConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, path = %config_path, "Failed to load config, using defaults");
        ScannerConfig::default()
    });
    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate()?;

    info!(
        ticker = %config.ticker,
        files = config.candle_files.len(),
        start_row = ?config.chunk.start_row,
        chunk_size = config.chunk.chunk_size,
        append = config.chunk.append,
        "Crossover scanner starting"
    );

    // ── 2. Indicator stage ───────────────────────────────────────────────
    if config.run_indicators {
        let rows = pipeline::run_indicator_stage(&config)?;
        info!(rows, path = %config.indicator_output, "File created");
    }

    // ── 3. Crossover stage ───────────────────────────────────────────────
    if config.run_crossovers {
        let run = pipeline::run_crossover_stage(&config)?;
        info!(
            found = run.found,
            total = run.total_actionable_rows,
            next_row = run.next_row,
            "Done! Actionable candles found in this chunk"
        );
    }

    Ok(())
}
