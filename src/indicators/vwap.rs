// =============================================================================
// Session VWAP — Volume-Weighted Average Price with a daily reset
// =============================================================================
//
// TP_t   = (high_t + low_t + close_t) / 3
// VWAP_t = Σ TP·volume / Σ volume, both sums running from the first row of
//          the calendar day that contains t.
//
// The day key is the date in the timestamp's own offset, so an exchange
// session never straddles two keys.  Each sum skips rows where its own term
// is missing: a bar with volume but no typical price still adds to Σ volume.
// Such a row is itself undefined.
// =============================================================================

use chrono::NaiveDate;

use crate::market_data::Candle;

/// Compute the session VWAP for each candle (oldest first).
pub fn calculate_session_vwap(candles: &[Candle]) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(candles.len());

    let mut session: Option<NaiveDate> = None;
    let mut cum_tpv = 0.0_f64;
    let mut cum_vol = 0.0_f64;

    for candle in candles {
        let day = candle.timestamp.date_naive();
        if session != Some(day) {
            session = Some(day);
            cum_tpv = 0.0;
            cum_vol = 0.0;
        }

        if let Some(volume) = candle.volume {
            cum_vol += volume;
        }
        let Some((tp, volume)) = candle.typical_price().zip(candle.volume) else {
            result.push(None);
            continue;
        };
        cum_tpv += tp * volume;

        let vwap = if cum_vol == 0.0 {
            None
        } else {
            Some(cum_tpv / cum_vol).filter(|v| v.is_finite())
        };
        result.push(vwap);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::candle::parse_timestamp;

    fn candle(ts: &str, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: parse_timestamp(ts).unwrap(),
            open: Some(close),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    #[test]
    fn vwap_accumulates_within_a_day() {
        let candles = vec![
            candle("2024-01-02T09:15:00+0530", 12.0, 8.0, 10.0, 100.0),
            candle("2024-01-02T09:30:00+0530", 22.0, 18.0, 20.0, 300.0),
        ];
        let vwap = calculate_session_vwap(&candles);
        assert_eq!(vwap[0], Some(10.0));
        // (10*100 + 20*300) / 400
        assert_eq!(vwap[1], Some(17.5));
    }

    #[test]
    fn vwap_resets_at_day_boundary() {
        let candles = vec![
            candle("2024-01-02T15:15:00+0530", 105.0, 95.0, 100.0, 5000.0),
            candle("2024-01-03T09:15:00+0530", 13.0, 10.0, 10.0, 1.0),
        ];
        let vwap = calculate_session_vwap(&candles);
        assert_eq!(vwap[0], Some(100.0));
        assert_eq!(vwap[1], candles[1].typical_price());
    }

    #[test]
    fn day_key_uses_local_offset() {
        // Both rows fall on the 2nd in UTC but on different local days.
        let candles = vec![
            candle("2024-01-02T22:00:00+0530", 11.0, 9.0, 10.0, 10.0),
            candle("2024-01-03T05:15:00+0530", 31.0, 29.0, 30.0, 10.0),
        ];
        let vwap = calculate_session_vwap(&candles);
        assert_eq!(vwap[1], Some(30.0));
    }

    #[test]
    fn zero_volume_is_undefined() {
        let candles = vec![
            candle("2024-01-02T09:15:00+0530", 12.0, 8.0, 10.0, 0.0),
            candle("2024-01-02T09:30:00+0530", 12.0, 8.0, 10.0, 50.0),
        ];
        let vwap = calculate_session_vwap(&candles);
        assert_eq!(vwap[0], None);
        assert_eq!(vwap[1], Some(10.0));
    }

    #[test]
    fn price_gap_row_is_undefined_but_its_volume_counts() {
        let mut gap = candle("2024-01-02T09:30:00+0530", 0.0, 0.0, 0.0, 999.0);
        gap.high = None;
        let candles = vec![
            candle("2024-01-02T09:15:00+0530", 12.0, 8.0, 10.0, 100.0),
            gap,
            candle("2024-01-02T09:45:00+0530", 12.0, 8.0, 10.0, 100.0),
        ];
        let vwap = calculate_session_vwap(&candles);
        // (10*100 + 10*100) / (100 + 999 + 100)
        assert_eq!(vwap, vec![Some(10.0), None, Some(2000.0 / 1199.0)]);
    }

    #[test]
    fn volume_gap_row_contributes_nothing() {
        let mut gap = candle("2024-01-02T09:30:00+0530", 52.0, 48.0, 50.0, 0.0);
        gap.volume = None;
        let candles = vec![
            candle("2024-01-02T09:15:00+0530", 12.0, 8.0, 10.0, 100.0),
            gap,
            candle("2024-01-02T09:45:00+0530", 22.0, 18.0, 20.0, 100.0),
        ];
        let vwap = calculate_session_vwap(&candles);
        assert_eq!(vwap, vec![Some(10.0), None, Some(15.0)]);
    }
}
