// =============================================================================
// Comparison set — which series is checked against which reference
// =============================================================================
//
// Default set (31 comparisons for 7 SMA periods):
//   Price_vs_SMA_{p}        close vs every SMA                         (7)
//   SMA_{a}_vs_SMA_{b}      every SMA pair, shorter period first       (21)
//   Price_vs_VWAP           close vs session VWAP                      (1)
//   RSI_vs_{level}          RSI vs each flat threshold (30, 70)        (2)
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::crossover::{detect_crossover, Crossover};
use crate::indicators::{AnnotatedCandle, IndicatorKind, IndicatorParams};

fn default_rsi_levels() -> Vec<f64> {
    vec![30.0, 70.0]
}

/// Parameters of the crossover stage that are not implied by the indicator
/// set itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverParams {
    /// Flat RSI thresholds, written as `RSI_vs_{level}`.
    #[serde(default = "default_rsi_levels")]
    pub rsi_levels: Vec<f64>,
}

impl Default for CrossoverParams {
    fn default() -> Self {
        Self {
            rsi_levels: default_rsi_levels(),
        }
    }
}

impl CrossoverParams {
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.rsi_levels.iter().find(|l| !(0.0..=100.0).contains(*l)) {
            bail!("RSI level {level} is outside [0, 100]");
        }
        Ok(())
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Series {
    Close,
    Indicator(IndicatorKind),
    /// Same value at every row.
    Constant(f64),
}

impl Series {
    pub fn value_at(&self, row: &AnnotatedCandle) -> Option<f64> {
        match self {
            Self::Close => row.candle.close,
            Self::Indicator(kind) => row.indicators.get(*kind),
            Self::Constant(c) => Some(*c),
        }
    }

    pub fn indicator(&self) -> Option<IndicatorKind> {
        match self {
            Self::Indicator(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// A named `value` vs `reference` check.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub name: String,
    pub value: Series,
    pub reference: Series,
}

impl Comparison {
    pub fn new(name: impl Into<String>, value: Series, reference: Series) -> Self {
        Self {
            name: name.into(),
            value,
            reference,
        }
    }

    /// Evaluate on `current` with `previous` as its immediate predecessor in
    /// the full series.
    pub fn evaluate(
        &self,
        current: &AnnotatedCandle,
        previous: &AnnotatedCandle,
    ) -> Option<Crossover> {
        detect_crossover(
            self.value.value_at(current),
            self.value.value_at(previous),
            self.reference.value_at(current),
            self.reference.value_at(previous),
        )
    }
}

/// Build the ordered comparison set for the declared indicator parameters.
pub fn comparison_set(indicators: &IndicatorParams, params: &CrossoverParams) -> Vec<Comparison> {
    let periods = indicators.sorted_sma_periods();
    let mut set = Vec::new();

    for &p in &periods {
        let sma = IndicatorKind::Sma(p);
        set.push(Comparison::new(
            format!("Price_vs_{sma}"),
            Series::Close,
            Series::Indicator(sma),
        ));
    }

    for (idx, &short) in periods.iter().enumerate() {
        for &long in &periods[idx + 1..] {
            let (short, long) = (IndicatorKind::Sma(short), IndicatorKind::Sma(long));
            set.push(Comparison::new(
                format!("{short}_vs_{long}"),
                Series::Indicator(short),
                Series::Indicator(long),
            ));
        }
    }

    set.push(Comparison::new(
        "Price_vs_VWAP",
        Series::Close,
        Series::Indicator(IndicatorKind::Vwap),
    ));

    let rsi = IndicatorKind::Rsi(indicators.rsi_period);
    for &level in &params.rsi_levels {
        set.push(Comparison::new(
            format!("RSI_vs_{level}"),
            Series::Indicator(rsi),
            Series::Constant(level),
        ));
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_has_31_named_comparisons() {
        let set = comparison_set(&IndicatorParams::default(), &CrossoverParams::default());
        assert_eq!(set.len(), 31);

        let names: Vec<&str> = set.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names[0], "Price_vs_SMA_5");
        assert_eq!(names[6], "Price_vs_SMA_500");
        assert_eq!(names[7], "SMA_5_vs_SMA_10");
        assert_eq!(names[27], "SMA_200_vs_SMA_500");
        assert_eq!(names[28], "Price_vs_VWAP");
        assert_eq!(names[29], "RSI_vs_30");
        assert_eq!(names[30], "RSI_vs_70");

        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 31);
    }

    #[test]
    fn pairs_put_shorter_period_first_even_if_declared_unsorted() {
        let indicators = IndicatorParams {
            sma_periods: vec![50, 5, 20],
            ..IndicatorParams::default()
        };
        let set = comparison_set(&indicators, &CrossoverParams::default());
        let names: Vec<&str> = set.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"SMA_5_vs_SMA_20"));
        assert!(names.contains(&"SMA_20_vs_SMA_50"));
        assert!(!names.contains(&"SMA_50_vs_SMA_5"));
        // 3 price + 3 pairs + VWAP + 2 RSI
        assert_eq!(set.len(), 9);
    }

    #[test]
    fn fractional_rsi_level_name() {
        let params = CrossoverParams {
            rsi_levels: vec![32.5],
        };
        let set = comparison_set(&IndicatorParams::default(), &params);
        assert_eq!(set.last().unwrap().name, "RSI_vs_32.5");
    }

    #[test]
    fn out_of_range_rsi_level_is_rejected() {
        let params = CrossoverParams {
            rsi_levels: vec![30.0, 170.0],
        };
        assert!(params.validate().is_err());
        assert!(CrossoverParams::default().validate().is_ok());
    }
}
