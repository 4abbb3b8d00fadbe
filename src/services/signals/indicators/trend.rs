//! Trend classification from a fast/slow EMA stack.

use super::ema::Ema;
use super::Indicator;
use crate::types::{Candle, Trend};

/// Classifies the last close against EMA(21) and EMA(55).
///
/// - price > fast > slow: `STRONG_UP`
/// - price < fast < slow: `STRONG_DOWN`
/// - price > slow and fast > slow: `WEAK_UP`
/// - price < slow and fast < slow: `WEAK_DOWN`
/// - anything else, or too little history: `SIDEWAYS`
pub struct TrendClassifier {
    fast_period: usize,
    slow_period: usize,
    min_candles: usize,
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self {
            fast_period: 21,
            slow_period: 55,
            min_candles: 50,
        }
    }
}

impl TrendClassifier {
    /// Classify, falling back to `SIDEWAYS` when an EMA is unavailable.
    pub fn classify(&self, candles: &[Candle]) -> Trend {
        if candles.len() < self.min_candles {
            return Trend::Sideways;
        }

        let (Some(fast), Some(slow), Some(last)) = (
            Ema::calculate_ema(candles, self.fast_period),
            Ema::calculate_ema(candles, self.slow_period),
            candles.last(),
        ) else {
            return Trend::Sideways;
        };
        let price = last.close;

        if above(price, fast) && above(fast, slow) {
            Trend::StrongUp
        } else if above(fast, price) && above(slow, fast) {
            Trend::StrongDown
        } else if above(price, slow) && above(fast, slow) {
            Trend::WeakUp
        } else if above(slow, price) && above(slow, fast) {
            Trend::WeakDown
        } else {
            Trend::Sideways
        }
    }
}

/// Relative tolerance under which two levels count as equal.
///
/// EMA seeds accumulate rounding error, so a flat series yields EMAs a few
/// ulps apart.
const REL_EPSILON: f64 = 1e-12;

/// `a > b` by more than rounding noise.
fn above(a: f64, b: f64) -> bool {
    a - b > REL_EPSILON * b.abs()
}

impl Indicator for TrendClassifier {
    type Output = Trend;

    fn min_periods(&self) -> usize {
        self.min_candles
    }

    fn calculate(&self, candles: &[Candle]) -> Option<Trend> {
        Some(self.classify(candles))
    }
}
