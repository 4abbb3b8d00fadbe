//! Directional signal derivation.

use super::indicators::{
    AdaptiveRsi, Atr, BollingerBands, Ema, Indicator, Macd, TrendClassifier,
};
use super::market;
use super::quality::QualityScorer;
use crate::config::{IndicatorSettings, SignalSettings};
use crate::types::{
    round_to, BandPosition, Candle, Direction, DisplayValues, EvaluatedSignal, IndicatorSnapshot,
    SignalCandidate, SignalStrength,
};
use chrono::{DateTime, Local, Timelike};
use tracing::debug;

/// Candles required before any candidate is derived.
pub const MIN_CANDLES: usize = 60;

/// |MACD histogram| above which momentum counts as strong.
const MACD_STRONG: f64 = 0.0001;

/// Turns a candle window into a scored candidate, or nothing.
pub struct SignalDeriver {
    settings: IndicatorSettings,
    adaptive_rsi: bool,
    session_filter: bool,
    blackout_hours: Vec<u32>,
    scorer: QualityScorer,
}

impl SignalDeriver {
    pub fn new(settings: &SignalSettings) -> Self {
        Self {
            settings: settings.settings.clone(),
            adaptive_rsi: settings.advanced.adaptive_rsi,
            session_filter: settings.advanced.market_session_filter,
            blackout_hours: settings.advanced.blackout_hours.clone(),
            scorer: QualityScorer::new(&settings.settings, settings.scoring.clone()),
        }
    }

    /// Compute every indicator over `candles` as seen at `now`.
    pub fn snapshot(&self, candles: &[Candle], now: DateTime<Local>) -> Option<IndicatorSnapshot> {
        let s = &self.settings;
        let price = candles.last()?.close;

        let macd = Macd::new(s.macd_fast, s.macd_slow, s.macd_signal).calculate(candles);
        let bands = BollingerBands::new(s.bb_period, s.bb_deviation).calculate(candles);

        Some(IndicatorSnapshot {
            price,
            rsi: AdaptiveRsi::new(self.adaptive_rsi, s.rsi_period).calculate(candles),
            ema: Ema::new(s.ma_period).calculate(candles),
            macd_line: macd.map(|m| m.line),
            macd_signal: macd.map(|m| m.signal),
            macd_histogram: macd.map(|m| m.histogram),
            bb_upper: bands.map(|b| b.upper),
            bb_middle: bands.map(|b| b.middle),
            bb_lower: bands.map(|b| b.lower),
            atr: Atr::new(s.atr_period).calculate(candles),
            trend: TrendClassifier::default().classify(candles),
            session: market::session_at(&now),
        })
    }

    /// Derive and score a candidate for `symbol`.
    ///
    /// Returns `None` for too little history, a blackout hour, a missing core
    /// indicator, or when neither directional rule fires.
    pub fn derive(
        &self,
        symbol: &str,
        candles: &[Candle],
        now: DateTime<Local>,
    ) -> Option<EvaluatedSignal> {
        if candles.len() < MIN_CANDLES {
            debug!("{}: {} candles, need {}", symbol, candles.len(), MIN_CANDLES);
            return None;
        }

        if self.session_filter && self.blackout_hours.contains(&now.hour()) {
            debug!("{}: blackout hour {}", symbol, now.hour());
            return None;
        }

        let snapshot = self.snapshot(candles, now)?;
        let price = snapshot.price;
        let (Some(rsi), Some(ema), Some(macd_line), Some(macd_signal), Some(macd_histogram)) = (
            snapshot.rsi,
            snapshot.ema,
            snapshot.macd_line,
            snapshot.macd_signal,
            snapshot.macd_histogram,
        ) else {
            return None;
        };
        let (Some(bb_upper), Some(bb_lower)) = (snapshot.bb_upper, snapshot.bb_lower) else {
            return None;
        };

        let bb_position = BandPosition::classify(price, bb_lower, bb_upper);

        let direction = if rsi < self.settings.rsi_oversold
            && price < ema
            && macd_line > macd_signal
            && bb_position != BandPosition::Upper
        {
            Direction::Call
        } else if rsi > self.settings.rsi_overbought
            && price > ema
            && macd_line < macd_signal
            && bb_position != BandPosition::Lower
        {
            Direction::Put
        } else {
            debug!(
                "{}: no signal (rsi {:.1}, price {:.5}, ema {:.5}, {})",
                symbol,
                rsi,
                price,
                ema,
                bb_position.label()
            );
            return None;
        };

        let strength = Self::strength(
            rsi,
            macd_histogram,
            bb_position,
            snapshot.trend.is_aligned_with(direction),
        );

        let display = DisplayValues {
            rsi: round_to(rsi, 1),
            price: round_to(price, 5),
            ema: round_to(ema, 5),
            macd_line: round_to(macd_line, 6),
            macd_signal: round_to(macd_signal, 6),
            macd_histogram: round_to(macd_histogram, 6),
            bb_upper: round_to(bb_upper, 5),
            bb_lower: round_to(bb_lower, 5),
            atr: snapshot.atr.map(|a| round_to(a, 6)).unwrap_or(0.0),
        };

        let candidate = SignalCandidate {
            symbol: symbol.to_string(),
            direction,
            strength,
            entry_price: display.price,
            bb_position,
            snapshot,
            display,
            timestamp: now,
        };
        let verification = self.scorer.verify(&candidate);

        debug!(
            "{}: {} {} score {}/{}",
            symbol, direction, strength, verification.score, verification.max_score
        );

        Some(EvaluatedSignal {
            candidate,
            verification,
        })
    }

    /// Strength label from the raw (unrounded) indicator values.
    pub fn strength(
        rsi: f64,
        macd_histogram: f64,
        bb_position: BandPosition,
        trend_aligned: bool,
    ) -> SignalStrength {
        let rsi_extreme = rsi < 20.0 || rsi > 80.0;
        let rsi_strong = rsi < 25.0 || rsi > 75.0;
        let macd_strong = macd_histogram.abs() > MACD_STRONG;
        let bb_extreme = bb_position.is_extreme();

        if rsi_extreme && macd_strong && bb_extreme && trend_aligned {
            SignalStrength::Extrema
        } else if (rsi_extreme && macd_strong) || (rsi_strong && bb_extreme) {
            SignalStrength::MuitoForte
        } else if rsi_strong || macd_strong {
            SignalStrength::Forte
        } else {
            SignalStrength::Medio
        }
    }
}
