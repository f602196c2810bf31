// =============================================================================
// Average True Range (ATR) — simple rolling mean
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// The first bar has no previous close, so TR_0 = H - L.  Terms that cannot be
// formed (missing legs) are left out of the max.
//
// ATR is the unweighted mean of the last `period` TR values.
// Default period: 14
// =============================================================================

use super::rolling::rolling_mean;
use crate::market_data::Candle;

/// True range for every candle (oldest first).
pub fn true_range(candles: &[Candle]) -> Vec<Option<f64>> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let prev_close = i.checked_sub(1).and_then(|p| candles[p].close);

            let hl = c.high.zip(c.low).map(|(h, l)| h - l);
            let hc = c.high.zip(prev_close).map(|(h, pc)| (h - pc).abs());
            let lc = c.low.zip(prev_close).map(|(l, pc)| (l - pc).abs());

            [hl, hc, lc].into_iter().flatten().reduce(f64::max)
        })
        .collect()
}

/// Compute the ATR series, one entry per candle.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_range(candles), period)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Build a test candle with the given H/L/C values, 15 minutes apart.
    fn candle(i: i64, high: f64, low: f64, close: f64) -> Candle {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 3, 45, 0).unwrap();
        Candle {
            timestamp: (base + Duration::minutes(15 * i)).fixed_offset(),
            open: Some(close),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(100.0),
        }
    }

    #[test]
    fn first_true_range_is_high_minus_low() {
        let candles = vec![candle(0, 105.0, 95.0, 100.0)];
        assert_eq!(true_range(&candles), vec![Some(10.0)]);
    }

    #[test]
    fn true_range_uses_prev_close() {
        // Gap scenario: |H - prevClose| > H - L
        let candles = vec![
            candle(0, 105.0, 95.0, 95.0),
            candle(1, 115.0, 108.0, 112.0),
        ];
        assert_eq!(true_range(&candles)[1], Some(20.0));
    }

    #[test]
    fn atr_insufficient_data() {
        let candles: Vec<Candle> = (0..10).map(|i| candle(i, 105.0, 95.0, 100.0)).collect();
        assert!(calculate_atr(&candles, 14).iter().all(Option::is_none));
    }

    #[test]
    fn atr_defined_from_period_minus_one() {
        let candles: Vec<Candle> = (0..20).map(|i| candle(i, 105.0, 95.0, 100.0)).collect();
        let atr = calculate_atr(&candles, 14);
        assert!(atr[..13].iter().all(Option::is_none));
        for v in &atr[13..] {
            assert_eq!(*v, Some(10.0));
        }
    }

    #[test]
    fn atr_flat_series_is_zero() {
        let candles: Vec<Candle> = (0..30).map(|i| candle(i, 50.0, 50.0, 50.0)).collect();
        for v in calculate_atr(&candles, 14).into_iter().flatten() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn missing_prev_close_falls_back_to_range() {
        let mut first = candle(0, 10.0, 10.0, 10.0);
        first.close = None;
        let candles = vec![first, candle(1, 30.0, 26.0, 28.0)];
        assert_eq!(true_range(&candles)[1], Some(4.0));
    }

    #[test]
    fn fully_missing_bar_is_undefined() {
        let mut gap = candle(1, 0.0, 0.0, 0.0);
        gap.high = None;
        gap.low = None;
        let candles = vec![candle(0, 11.0, 9.0, 10.0), gap];
        assert_eq!(true_range(&candles)[1], None);
    }
}
