//! Property checks for the indicator library

use vigil::services::signals::indicators::{
    Atr, BollingerBands, Ema, Indicator, Macd, Rsi, TrendClassifier,
};
use vigil::types::{Candle, Trend};

fn from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle::new(c, c + 0.001, c - 0.001, c, i as i64 * 60_000))
        .collect()
}

fn zigzag(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 1.1 + (i as f64 * 0.7).sin() * 0.004 + i as f64 * 0.0001)
        .collect()
}

#[test]
fn test_rsi_monotonic_rise_is_100() {
    let closes: Vec<f64> = (0..30).map(|i| 1.0 + i as f64 * 0.01).collect();
    assert_eq!(Rsi::new(14).calculate(&from_closes(&closes)), Some(100.0));
}

#[test]
fn test_rsi_within_bounds_and_scale_invariant() {
    let closes = zigzag(40);
    let scaled: Vec<f64> = closes.iter().map(|c| c * 250.0).collect();

    let rsi = Rsi::new(14).calculate(&from_closes(&closes)).unwrap();
    let rsi_scaled = Rsi::new(14).calculate(&from_closes(&scaled)).unwrap();

    assert!((0.0..=100.0).contains(&rsi));
    assert!((rsi - rsi_scaled).abs() < 1e-9);
}

#[test]
fn test_rsi_needs_period_plus_one() {
    let candles = from_closes(&zigzag(14));
    assert!(Rsi::new(14).calculate(&candles).is_none());
    assert!(Rsi::new(14).calculate(&from_closes(&zigzag(15))).is_some());
}

#[test]
fn test_ema_of_exact_period_is_sma() {
    let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
    let ema = Ema::new(5).calculate(&from_closes(&closes)).unwrap();
    assert!((ema - 3.0).abs() < 1e-12);
    assert!(Ema::new(6).calculate(&from_closes(&closes)).is_none());
}

#[test]
fn test_macd_requires_slow_plus_signal() {
    let macd = Macd::default();
    assert_eq!(macd.min_periods(), 35);
    assert!(macd.calculate(&from_closes(&zigzag(34))).is_none());

    let values = macd.calculate(&from_closes(&zigzag(60))).unwrap();
    assert!((values.histogram - (values.line - values.signal)).abs() < 1e-12);
}

#[test]
fn test_bollinger_band_ordering() {
    let bands = BollingerBands::new(20, 2.0)
        .calculate(&from_closes(&zigzag(40)))
        .unwrap();
    assert!(bands.lower < bands.middle);
    assert!(bands.middle < bands.upper);
    assert!(((bands.upper - bands.middle) - (bands.middle - bands.lower)).abs() < 1e-12);
}

#[test]
fn test_bollinger_flat_series_collapses() {
    let bands = BollingerBands::new(20, 2.0)
        .calculate(&from_closes(&[1.25; 25]))
        .unwrap();
    assert_eq!(bands.upper, bands.lower);
}

#[test]
fn test_atr_of_constant_range() {
    let atr = Atr::new(14).calculate(&from_closes(&[1.1; 20])).unwrap();
    assert!((atr - 0.002).abs() < 1e-12);
}

#[test]
fn test_trend_on_steady_rise_and_fall() {
    let rising: Vec<f64> = (0..80).map(|i| 1.0 + i as f64 * 0.001).collect();
    let falling: Vec<f64> = rising.iter().rev().copied().collect();
    let classifier = TrendClassifier::default();

    assert_eq!(classifier.classify(&from_closes(&rising)), Trend::StrongUp);
    assert_eq!(classifier.classify(&from_closes(&falling)), Trend::StrongDown);
    assert_eq!(classifier.classify(&from_closes(&rising[..30])), Trend::Sideways);
}
