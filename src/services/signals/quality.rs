//! Rule-based quality scoring of signal candidates.

use crate::config::IndicatorSettings;
use crate::types::{
    BandPosition, Direction, MarketSession, SignalCandidate, SignalStrength, Trend, Verification,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// ATR band, exclusive on both ends, in which volatility earns its point.
const ATR_LOW: f64 = 0.0001;
const ATR_HIGH: f64 = 0.005;

/// Point table used by the scorer.
///
/// The default is the 17-point table. Scales that ignore a component set
/// its weights to zero; the component still reports its issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Reported denominator. `None` derives it from the table.
    ///
    /// The canonical table is published as "/17" although its components
    /// top out at 15.
    pub scale: Option<u32>,
    /// RSI beyond 20/80.
    pub rsi_extreme: u32,
    /// RSI beyond 25/75.
    pub rsi_strong: u32,
    /// RSI beyond 30/70.
    pub rsi_moderate: u32,
    /// Line and histogram both confirm.
    pub macd_full: u32,
    pub macd_line_only: u32,
    pub macd_histogram_only: u32,
    /// Price at the band on the signal's side.
    pub bb_extreme: u32,
    pub bb_middle: u32,
    pub trend_aligned: u32,
    pub trend_sideways: u32,
    /// LONDON or NY session.
    pub session: u32,
    /// ATR inside the healthy band.
    pub volatility: u32,
    pub strength_extrema: u32,
    pub strength_muito_forte: u32,
    pub strength_forte: u32,
    pub strength_medio: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            scale: Some(17),
            rsi_extreme: 4,
            rsi_strong: 3,
            rsi_moderate: 2,
            macd_full: 3,
            macd_line_only: 2,
            macd_histogram_only: 1,
            bb_extreme: 2,
            bb_middle: 1,
            trend_aligned: 2,
            trend_sideways: 1,
            session: 1,
            volatility: 1,
            strength_extrema: 2,
            strength_muito_forte: 1,
            strength_forte: 0,
            strength_medio: 0,
        }
    }
}

impl ScoreWeights {
    /// Bonus awarded for a strength label.
    pub fn strength_bonus(&self, strength: SignalStrength) -> u32 {
        match strength {
            SignalStrength::Extrema => self.strength_extrema,
            SignalStrength::MuitoForte => self.strength_muito_forte,
            SignalStrength::Forte => self.strength_forte,
            SignalStrength::Medio => self.strength_medio,
        }
    }

    /// Denominator reported alongside scores.
    pub fn max_score(&self) -> u32 {
        self.scale.unwrap_or_else(|| self.attainable_max())
    }

    /// Highest score the table can actually award.
    pub fn attainable_max(&self) -> u32 {
        let rsi = self.rsi_extreme.max(self.rsi_strong).max(self.rsi_moderate);
        let macd = self
            .macd_full
            .max(self.macd_line_only)
            .max(self.macd_histogram_only);
        let bb = self.bb_extreme.max(self.bb_middle);
        let trend = self.trend_aligned.max(self.trend_sideways);
        let strength = self
            .strength_extrema
            .max(self.strength_muito_forte)
            .max(self.strength_forte)
            .max(self.strength_medio);

        rsi + macd + bb + trend + self.session + self.volatility + strength
    }
}

/// Internal scoring failure. Never escapes [`QualityScorer::verify`].
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
}

/// Scores candidates and renders a pass/fail verdict.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    weights: ScoreWeights,
    min_score: u32,
    trend_filter: bool,
    volatility_filter: bool,
}

impl QualityScorer {
    pub fn new(settings: &IndicatorSettings, weights: ScoreWeights) -> Self {
        Self {
            weights,
            min_score: settings.min_quality_score,
            trend_filter: settings.trend_filter,
            volatility_filter: settings.volatility_filter,
        }
    }

    pub fn max_score(&self) -> u32 {
        self.weights.max_score()
    }

    /// Score a candidate. Internal failures yield a zero-score rejection.
    pub fn verify(&self, candidate: &SignalCandidate) -> Verification {
        match self.try_score(candidate) {
            Ok(verification) => verification,
            Err(e) => {
                error!("Verification of {} failed: {}", candidate.symbol, e);
                Verification::error(self.max_score())
            }
        }
    }

    /// Score a candidate from its rounded display values.
    pub fn try_score(&self, candidate: &SignalCandidate) -> Result<Verification, ScoringError> {
        let d = &candidate.display;
        for (name, value) in [
            ("rsi", d.rsi),
            ("macd_line", d.macd_line),
            ("macd_signal", d.macd_signal),
            ("macd_histogram", d.macd_histogram),
            ("atr", d.atr),
        ] {
            if !value.is_finite() {
                return Err(ScoringError::NonFinite(name));
            }
        }

        let w = &self.weights;
        let direction = candidate.direction;
        let mut score = 0;
        let mut issues = Vec::new();

        score += self.score_rsi(direction, d.rsi, &mut issues);
        score += self.score_macd(
            direction,
            d.macd_line,
            d.macd_signal,
            d.macd_histogram,
            &mut issues,
        );
        score += self.score_bollinger(direction, candidate.bb_position);

        if self.trend_filter {
            let trend = candidate.snapshot.trend;
            if trend.is_aligned_with(direction) {
                score += w.trend_aligned;
            } else if trend == Trend::Sideways {
                score += w.trend_sideways;
            } else {
                issues.push(format!("Against trend ({})", trend));
            }
        }

        match candidate.snapshot.session {
            MarketSession::London | MarketSession::Ny => score += w.session,
            MarketSession::OffHours => issues.push("Low liquidity".to_string()),
            MarketSession::Asian => {}
        }

        if self.volatility_filter {
            if d.atr > ATR_LOW && d.atr < ATR_HIGH {
                score += w.volatility;
            } else if d.atr >= ATR_HIGH {
                issues.push("High volatility".to_string());
            } else {
                issues.push("Low volatility".to_string());
            }
        }

        score += w.strength_bonus(candidate.strength);

        Ok(Verification::new(score, self.max_score(), self.min_score, issues))
    }

    fn score_rsi(&self, direction: Direction, rsi: f64, issues: &mut Vec<String>) -> u32 {
        let w = &self.weights;
        // Distance into the signal's extreme, comparable for both directions
        let depth = match direction {
            Direction::Call => rsi,
            Direction::Put => 100.0 - rsi,
        };

        if depth < 20.0 {
            w.rsi_extreme
        } else if depth < 25.0 {
            w.rsi_strong
        } else if depth < 30.0 {
            w.rsi_moderate
        } else {
            issues.push(format!("RSI not extreme enough for {}", direction));
            0
        }
    }

    fn score_macd(
        &self,
        direction: Direction,
        line: f64,
        signal: f64,
        histogram: f64,
        issues: &mut Vec<String>,
    ) -> u32 {
        let w = &self.weights;
        let (line_confirms, histogram_confirms) = match direction {
            Direction::Call => (line > signal, histogram > 0.0),
            Direction::Put => (line < signal, histogram < 0.0),
        };

        match (line_confirms, histogram_confirms) {
            (true, true) => w.macd_full,
            (true, false) => w.macd_line_only,
            (false, true) => w.macd_histogram_only,
            (false, false) => {
                issues.push(format!("MACD does not confirm {}", direction));
                0
            }
        }
    }

    fn score_bollinger(&self, direction: Direction, position: BandPosition) -> u32 {
        match (direction, position) {
            (Direction::Call, BandPosition::Lower) | (Direction::Put, BandPosition::Upper) => {
                self.weights.bb_extreme
            }
            (_, BandPosition::Middle) => self.weights.bb_middle,
            _ => 0,
        }
    }
}
