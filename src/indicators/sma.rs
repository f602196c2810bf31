// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_t = (close_{t-p+1} + ... + close_t) / p
//
// Strict window completeness: the first `p - 1` rows, and every row whose
// window touches a missing close, are undefined.
// =============================================================================

use super::rolling::rolling_mean;

/// Compute the SMA series for `closes`, one entry per input row.
pub fn calculate_sma(closes: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling_mean(closes, period)
}
