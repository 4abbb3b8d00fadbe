//! Exponential Moving Average (EMA) indicator.

use super::Indicator;
use crate::types::{closes, Candle};

/// Full EMA series over `values`, seeded with the SMA of the first `period` values.
///
/// The first element corresponds to `values[period - 1]`. Empty when there
/// are fewer than `period` values.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // First EMA is SMA
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    let mut series = Vec::with_capacity(values.len() - period + 1);
    series.push(ema);

    for value in &values[period..] {
        ema = value * multiplier + ema * (1.0 - multiplier);
        series.push(ema);
    }

    series
}

/// EMA (Exponential Moving Average) indicator.
///
/// Like SMA but gives more weight to recent prices.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate EMA value.
    pub fn calculate_ema(candles: &[Candle], period: usize) -> Option<f64> {
        let closes = closes(candles);
        ema_series(&closes, period).last().copied()
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<f64> {
        Self::calculate_ema(candles, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(c, c, c, c, i as i64 * 60_000))
            .collect()
    }

    #[test]
    fn test_ema_insufficient_data() {
        let ema = Ema::new(21);
        assert!(ema.calculate(&create_candles(&[1.0; 20])).is_none());
        assert_eq!(ema.min_periods(), 21);
    }

    #[test]
    fn test_ema_seed_is_sma() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        let value = Ema::new(5).calculate(&create_candles(&closes)).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ema_constant_series() {
        let value = Ema::new(10).calculate(&create_candles(&[1.25; 40])).unwrap();
        assert!((value - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_ema_recursion() {
        // Seed 2.0 from [1, 2, 3], then one step with k = 0.5
        let value = Ema::new(3)
            .calculate(&create_candles(&[1.0, 2.0, 3.0, 6.0]))
            .unwrap();
        assert!((value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_ema_series_alignment() {
        let series = ema_series(&[1.0, 2.0, 3.0, 6.0, 6.0], 3);
        assert_eq!(series.len(), 3);
        assert!((series[0] - 2.0).abs() < 1e-12);
        assert!((series[1] - 4.0).abs() < 1e-12);
        assert!((series[2] - 5.0).abs() < 1e-12);
        assert!(ema_series(&[1.0, 2.0], 3).is_empty());
    }
}
