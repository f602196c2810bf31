// =============================================================================
// Relative Strength Index (RSI) — simple-average variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — delta_t = close_t - close_{t-1}.  An undefined delta (row 0, or a
//          missing close on either side) contributes zero gain and zero loss.
// Step 2 — gain_t = max(delta_t, 0), loss_t = max(-delta_t, 0).
// Step 3 — avg_gain / avg_loss are *unweighted* rolling means over the last
//          `period` gains / losses (no Wilder smoothing).
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Because row 0 contributes a zero gain, RSI(14) is first defined at row 13.
// =============================================================================

use super::rolling::rolling_mean;

/// Compute the RSI series for `closes`, one entry per input row.
///
/// # Edge cases
/// - `period == 0` or fewer than `period` rows => all `None`.
/// - Zero average loss saturates to 100.0 (RS is infinite).
pub fn calculate_rsi(closes: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        let delta = match (i.checked_sub(1).and_then(|p| closes[p]), closes[i]) {
            (Some(prev), Some(curr)) => curr - prev,
            _ => 0.0,
        };
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }

    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    avg_gains
        .into_iter()
        .zip(avg_losses)
        .map(|(g, l)| rsi_from_averages(g?, l?))
        .collect()
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if rsi.is_finite() {
        Some(rsi)
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: impl IntoIterator<Item = f64>) -> Vec<Option<f64>> {
        values.into_iter().map(Some).collect()
    }

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_period_zero() {
        assert!(calculate_rsi(&series([1.0, 2.0, 3.0]), 0)
            .iter()
            .all(Option::is_none));
    }

    #[test]
    fn rsi_first_defined_at_period_minus_one() {
        let closes = series((1..=20).map(|x| x as f64));
        let rsi = calculate_rsi(&closes, 14);
        assert_eq!(rsi.len(), 20);
        assert!(rsi[..13].iter().all(Option::is_none));
        assert!(rsi[13].is_some());
    }

    #[test]
    fn rsi_all_gains() {
        let closes = series((1..=30).map(|x| x as f64));
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!((v - 100.0).abs() < 1e-10, "expected 100.0, got {v}");
        }
    }

    #[test]
    fn rsi_all_losses() {
        let closes = series((1..=30).rev().map(|x| x as f64));
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_market_saturates() {
        let closes = vec![Some(100.0); 30];
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!((v - 100.0).abs() < 1e-10, "expected 100.0, got {v}");
        }
    }

    #[test]
    fn rsi_known_values() {
        // gains [0, 2, 0], losses [0, 0, 1] over a 2-row window.
        let rsi = calculate_rsi(&series([10.0, 12.0, 11.0]), 2);
        assert_eq!(rsi[0], None);
        assert_eq!(rsi[1], Some(100.0));
        let v = rsi[2].unwrap();
        assert!((v - 200.0 / 3.0).abs() < 1e-10, "got {v}");
    }

    #[test]
    fn rsi_missing_close_counts_as_no_move() {
        let closes = vec![Some(10.0), None, Some(12.0), Some(11.0)];
        let rsi = calculate_rsi(&closes, 2);
        // Both deltas around the gap are zero, so the last window is [0, -1].
        assert_eq!(rsi[2], Some(100.0));
        assert_eq!(rsi[3], Some(0.0));
    }

    #[test]
    fn rsi_range_check() {
        let closes = series([
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ]);
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }
}
