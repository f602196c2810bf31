// =============================================================================
// Indicator Engine — annotate a candle series with every configured column
// =============================================================================
//
// Input:  a merged candle series, strictly increasing by timestamp.
// Output: one `AnnotatedCandle` per input row, same order, same count.
//
// Columns, in order: SMA for every configured period, RSI, VWAP, ATR.  Every
// value is rounded to `decimals` places; undefined values stay `None`.
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::rolling::round_to;
use super::snapshot::{AnnotatedCandle, IndicatorKind, IndicatorSnapshot};
use super::{atr, rsi, sma, vwap};
use crate::market_data::candle::ensure_chronological;
use crate::market_data::Candle;

fn default_sma_periods() -> Vec<usize> {
    vec![5, 10, 20, 50, 100, 200, 500]
}

fn default_rsi_period() -> usize {
    14
}

fn default_atr_period() -> usize {
    14
}

fn default_decimals() -> u32 {
    2
}

/// Declared parameters of the indicator set.  Both engines read the same
/// instance so the columns written here are exactly the ones compared later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// SMA look-back periods, written as `SMA_{p}`.
    #[serde(default = "default_sma_periods")]
    pub sma_periods: Vec<usize>,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// Decimal places every indicator is rounded to.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_periods: default_sma_periods(),
            rsi_period: default_rsi_period(),
            atr_period: default_atr_period(),
            decimals: default_decimals(),
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<()> {
        if self.sma_periods.is_empty() {
            bail!("sma_periods must not be empty");
        }
        if self.sma_periods.contains(&0) {
            bail!("sma_periods must be positive");
        }
        let mut sorted = self.sma_periods.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != self.sma_periods.len() {
            bail!("sma_periods contains duplicates: {:?}", self.sma_periods);
        }
        if self.rsi_period == 0 || self.atr_period == 0 {
            bail!("rsi_period and atr_period must be positive");
        }
        if self.decimals > 10 {
            bail!("decimals must be at most 10, got {}", self.decimals);
        }
        Ok(())
    }

    /// SMA periods in ascending order.
    pub fn sorted_sma_periods(&self) -> Vec<usize> {
        let mut periods = self.sma_periods.clone();
        periods.sort_unstable();
        periods
    }

    /// Every column the engine writes, in output order.
    pub fn columns(&self) -> Vec<IndicatorKind> {
        let mut columns: Vec<IndicatorKind> = self
            .sorted_sma_periods()
            .into_iter()
            .map(IndicatorKind::Sma)
            .collect();
        columns.push(IndicatorKind::Rsi(self.rsi_period));
        columns.push(IndicatorKind::Vwap);
        columns.push(IndicatorKind::Atr(self.atr_period));
        columns
    }
}

/// Computes the fixed indicator vector for every row of a series.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Annotate `candles` with every configured indicator.
    ///
    /// Fails when timestamps are not strictly increasing.
    pub fn annotate(&self, candles: Vec<Candle>) -> Result<Vec<AnnotatedCandle>> {
        ensure_chronological(candles.iter().map(|c| &c.timestamp))?;

        let closes: Vec<Option<f64>> = candles.iter().map(|c| c.close).collect();

        let columns: Vec<(IndicatorKind, Vec<Option<f64>>)> = self
            .params
            .columns()
            .into_iter()
            .map(|kind| {
                let series = match kind {
                    IndicatorKind::Sma(p) => sma::calculate_sma(&closes, p),
                    IndicatorKind::Rsi(p) => rsi::calculate_rsi(&closes, p),
                    IndicatorKind::Vwap => vwap::calculate_session_vwap(&candles),
                    IndicatorKind::Atr(p) => atr::calculate_atr(&candles, p),
                };
                debug!(
                    column = %kind,
                    defined = series.iter().filter(|v| v.is_some()).count(),
                    "indicator column computed"
                );
                (kind, series)
            })
            .collect();

        let decimals = self.params.decimals;
        let annotated: Vec<AnnotatedCandle> = candles
            .into_iter()
            .enumerate()
            .map(|(row, candle)| {
                let mut indicators = IndicatorSnapshot::with_capacity(columns.len());
                for (kind, series) in &columns {
                    indicators.insert(*kind, series[row].map(|v| round_to(v, decimals)));
                }
                AnnotatedCandle { candle, indicators }
            })
            .collect();

        info!(
            rows = annotated.len(),
            columns = columns.len(),
            "indicator series annotated"
        );
        Ok(annotated)
    }
}
