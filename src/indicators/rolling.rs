// =============================================================================
// Rolling-window helpers shared by the indicator calculators
// =============================================================================

/// Arithmetic mean over the trailing `period` values for every index.
///
/// The output has the same length as `values`.  An entry is `None` when fewer
/// than `period` values precede it (inclusive), when any value in its window
/// is undefined, or when the mean is non-finite.
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return result;
    }

    let period_f = period as f64;
    for (start, window) in values.windows(period).enumerate() {
        // Summing Options short-circuits to None on the first gap.
        let sum: Option<f64> = window.iter().copied().sum();
        result[start + period - 1] = sum.map(|s| s / period_f).filter(|m| m.is_finite());
    }
    result
}

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}
