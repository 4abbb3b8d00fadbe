//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema_series;
use super::Indicator;
use crate::types::{closes, Candle};

/// Latest MACD values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValues {
    /// EMA(fast) - EMA(slow).
    pub line: f64,
    /// EMA(signal) of the MACD line.
    pub signal: f64,
    /// Line minus signal.
    pub histogram: f64,
}

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdValues;

    fn min_periods(&self) -> usize {
        self.slow_period + self.signal_period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<MacdValues> {
        if self.fast_period == 0 || self.signal_period == 0 || candles.len() < self.min_periods()
        {
            return None;
        }

        let closes = closes(candles);

        let fast_ema = ema_series(&closes, self.fast_period);
        let slow_ema = ema_series(&closes, self.slow_period);

        if fast_ema.is_empty() || slow_ema.is_empty() {
            return None;
        }

        // Both series end at the last close; align them on the shorter tail
        let len = fast_ema.len().min(slow_ema.len());
        let macd_line: Vec<f64> = fast_ema[fast_ema.len() - len..]
            .iter()
            .zip(&slow_ema[slow_ema.len() - len..])
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = ema_series(&macd_line, self.signal_period);

        let line = *macd_line.last()?;
        let signal = *signal_line.last()?;

        Some(MacdValues {
            line,
            signal,
            histogram: line - signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_candles(closes: impl Iterator<Item = f64>) -> Vec<Candle> {
        closes
            .enumerate()
            .map(|(i, c)| Candle::new(c, c + 0.001, c - 0.001, c, i as i64 * 60_000))
            .collect()
    }

    #[test]
    fn test_macd_min_periods() {
        let macd = Macd::default();
        assert_eq!(macd.min_periods(), 35);
        assert!(macd
            .calculate(&create_candles((0..34).map(|i| 1.0 + i as f64 * 0.001)))
            .is_none());
        assert!(macd
            .calculate(&create_candles((0..35).map(|i| 1.0 + i as f64 * 0.001)))
            .is_some());
    }

    #[test]
    fn test_macd_flat_series_is_zero() {
        let values = Macd::default()
            .calculate(&create_candles(std::iter::repeat(1.1).take(60)))
            .unwrap();
        assert!(values.line.abs() < 1e-12);
        assert!(values.signal.abs() < 1e-12);
        assert!(values.histogram.abs() < 1e-12);
    }

    #[test]
    fn test_macd_uptrend_positive_line() {
        let values = Macd::default()
            .calculate(&create_candles((0..80).map(|i| 1.0 + i as f64 * 0.001)))
            .unwrap();
        assert!(values.line > 0.0);
        assert!((values.histogram - (values.line - values.signal)).abs() < 1e-15);
    }

    #[test]
    fn test_macd_downtrend_negative_line() {
        let values = Macd::default()
            .calculate(&create_candles((0..80).map(|i| 2.0 - i as f64 * 0.001)))
            .unwrap();
        assert!(values.line < 0.0);
    }
}
