//! Technical indicator implementations.
//!
//! Every indicator is a pure function of an oldest-to-newest candle slice
//! and yields `None` when the slice is too short for it.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod trend;

pub use atr::Atr;
pub use bollinger::{BollingerBands, BollingerValues};
pub use ema::{ema_series, Ema};
pub use macd::{Macd, MacdValues};
pub use rsi::{AdaptiveRsi, Rsi};
pub use trend::TrendClassifier;

use crate::types::Candle;

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    /// Value produced by one calculation.
    type Output;

    /// Minimum number of candles required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator from OHLC candle data.
    /// Returns None if there is insufficient data.
    fn calculate(&self, candles: &[Candle]) -> Option<Self::Output>;
}
