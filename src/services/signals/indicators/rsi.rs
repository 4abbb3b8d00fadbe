//! Relative Strength Index (RSI) indicator.

use super::Indicator;
use crate::types::Candle;

/// Candles used to measure volatility for adaptive period selection.
const ADAPTIVE_LOOKBACK: usize = 20;
/// Period used when the adaptive lookback is not yet available.
const FALLBACK_PERIOD: usize = 14;

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses
/// over the last `period` price changes, using simple averages.
/// Values range from 0-100:
/// - Below the oversold threshold: potential CALL
/// - Above the overbought threshold: potential PUT
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate RSI from the last `period + 1` closes.
    pub fn calculate_rsi(candles: &[Candle], period: usize) -> Option<f64> {
        if period == 0 || candles.len() < period + 1 {
            return None;
        }

        let window = &candles[candles.len() - period - 1..];
        let mut gains = 0.0;
        let mut losses = 0.0;

        for pair in window.windows(2) {
            let change = pair[1].close - pair[0].close;
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }

        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;

        if avg_loss == 0.0 {
            return Some(100.0);
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<f64> {
        Self::calculate_rsi(candles, self.period)
    }
}

/// RSI whose period follows recent volatility.
///
/// Volatility is the coefficient of variation (sample stdev / mean) of the
/// last 20 closes: above 2% selects period 9, below 0.5% selects 21,
/// anything in between 14. With fewer than 20 candles the period is 14.
/// When disabled, behaves as a plain RSI with the configured period.
pub struct AdaptiveRsi {
    enabled: bool,
    fixed_period: usize,
}

impl AdaptiveRsi {
    pub fn new(enabled: bool, fixed_period: usize) -> Self {
        Self {
            enabled,
            fixed_period,
        }
    }

    /// Coefficient of variation of the last 20 closes.
    pub fn volatility(candles: &[Candle]) -> Option<f64> {
        if candles.len() < ADAPTIVE_LOOKBACK {
            return None;
        }

        let closes: Vec<f64> = candles[candles.len() - ADAPTIVE_LOOKBACK..]
            .iter()
            .map(|c| c.close)
            .collect();
        let n = closes.len() as f64;
        let mean = closes.iter().sum::<f64>() / n;
        let variance = closes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let cv = variance.sqrt() / mean;

        cv.is_finite().then_some(cv)
    }

    /// Period to use for the given candles.
    pub fn select_period(&self, candles: &[Candle]) -> usize {
        if !self.enabled {
            return self.fixed_period;
        }

        match Self::volatility(candles) {
            Some(v) if v > 0.02 => 9,
            Some(v) if v < 0.005 => 21,
            _ => FALLBACK_PERIOD,
        }
    }
}

impl Indicator for AdaptiveRsi {
    type Output = f64;

    fn min_periods(&self) -> usize {
        if self.enabled {
            FALLBACK_PERIOD + 1
        } else {
            self.fixed_period + 1
        }
    }

    fn calculate(&self, candles: &[Candle]) -> Option<f64> {
        Rsi::calculate_rsi(candles, self.select_period(candles))
    }
}
