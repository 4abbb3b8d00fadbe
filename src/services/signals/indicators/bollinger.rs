//! Bollinger Bands indicator.

use super::Indicator;
use crate::types::Candle;

/// Latest band values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerValues {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// The deviation is the population standard deviation of the window.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }

    /// Calculate standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }
}

impl Indicator for BollingerBands {
    type Output = BollingerValues;

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<BollingerValues> {
        if self.period == 0 || candles.len() < self.period {
            return None;
        }

        let window: Vec<f64> = candles[candles.len() - self.period..]
            .iter()
            .map(|c| c.close)
            .collect();
        let middle = window.iter().sum::<f64>() / self.period as f64;
        let band = Self::std_dev(&window, middle) * self.std_dev_multiplier;

        Some(BollingerValues {
            upper: middle + band,
            middle,
            lower: middle - band,
        })
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
    fn test_bollinger_insufficient_data() {
        let bb = BollingerBands::default();
        assert!(bb.calculate(&create_candles(&[1.0; 19])).is_none());
        assert!(bb.calculate(&create_candles(&[1.0; 20])).is_some());
    }

    #[test]
    fn test_bollinger_flat_series_collapses() {
        let values = BollingerBands::default()
            .calculate(&create_candles(&[1.1; 30]))
            .unwrap();
        assert!((values.upper - 1.1).abs() < 1e-12);
        assert!((values.lower - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_population_deviation() {
        // Mean 5, population stdev 2
        let closes = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let values = BollingerBands::new(8, 2.0)
            .calculate(&create_candles(&closes))
            .unwrap();
        assert!((values.middle - 5.0).abs() < 1e-12);
        assert!((values.upper - 9.0).abs() < 1e-12);
        assert!((values.lower - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_uses_last_window() {
        let mut closes = vec![100.0; 10];
        closes.extend([1.0; 20]);
        let values = BollingerBands::default()
            .calculate(&create_candles(&closes))
            .unwrap();
        assert!((values.middle - 1.0).abs() < 1e-12);
    }
}
