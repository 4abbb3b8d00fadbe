//! Average True Range (ATR) indicator.

use super::Indicator;
use crate::types::Candle;

/// ATR (Average True Range) indicator.
///
/// Simple average of the last `period` true ranges:
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|)
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate True Range.
    fn true_range(current: &Candle, previous: &Candle) -> f64 {
        let hl = current.high - current.low;
        let hc = (current.high - previous.close).abs();
        let lc = (current.low - previous.close).abs();
        hl.max(hc).max(lc)
    }
}

impl Indicator for Atr {
    type Output = f64;

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<f64> {
        if self.period == 0 || candles.len() < self.min_periods() {
            return None;
        }

        let window = &candles[candles.len() - self.period - 1..];
        let total: f64 = window
            .windows(2)
            .map(|pair| Self::true_range(&pair[1], &pair[0]))
            .sum();

        Some(total / self.period as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atr_insufficient_data() {
        let atr = Atr::default();
        let candles: Vec<Candle> = (0..14)
            .map(|i| Candle::new(1.0, 1.1, 0.9, 1.0, i * 60_000))
            .collect();
        assert!(atr.calculate(&candles).is_none());
    }

    #[test]
    fn test_atr_constant_range() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| Candle::new(1.0, 1.002, 0.998, 1.0, i * 60_000))
            .collect();
        let value = Atr::default().calculate(&candles).unwrap();
        assert!((value - 0.004).abs() < 1e-12);
    }

    #[test]
    fn test_atr_includes_gaps() {
        // Each bar gaps 0.01 above the previous close with a 0.002 range
        let candles: Vec<Candle> = (0..20)
            .map(|i| {
                let base = 1.0 + i as f64 * 0.01;
                Candle::new(base, base + 0.001, base - 0.001, base, i * 60_000)
            })
            .collect();
        let value = Atr::new(5).calculate(&candles).unwrap();
        assert!((value - 0.011).abs() < 1e-9);
    }
}
