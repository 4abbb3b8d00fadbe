use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier returned by a notification sink.
pub type MessageId = i64;

/// Direction of a short-term signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "CALL")]
    Call,
    #[serde(rename = "PUT")]
    Put,
}

impl Direction {
    /// Get display label for this direction.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Call => "CALL",
            Direction::Put => "PUT",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Direction::Call => "🟢",
            Direction::Put => "🔴",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Qualitative strength of a derived signal, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalStrength {
    #[serde(rename = "MÉDIO")]
    Medio,
    #[serde(rename = "FORTE")]
    Forte,
    #[serde(rename = "MUITO FORTE")]
    MuitoForte,
    #[serde(rename = "EXTREMA")]
    Extrema,
}

impl SignalStrength {
    /// Get display label for this strength.
    pub fn label(&self) -> &'static str {
        match self {
            SignalStrength::Medio => "MÉDIO",
            SignalStrength::Forte => "FORTE",
            SignalStrength::MuitoForte => "MUITO FORTE",
            SignalStrength::Extrema => "EXTREMA",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            SignalStrength::Medio => "⚡",
            SignalStrength::Forte => "💪",
            SignalStrength::MuitoForte => "🔥💪",
            SignalStrength::Extrema => "🔥💎",
        }
    }
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trend classification from the fast/slow EMA stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    StrongUp,
    WeakUp,
    Sideways,
    WeakDown,
    StrongDown,
}

impl Trend {
    /// Get display label for this trend.
    pub fn label(&self) -> &'static str {
        match self {
            Trend::StrongUp => "STRONG_UP",
            Trend::WeakUp => "WEAK_UP",
            Trend::Sideways => "SIDEWAYS",
            Trend::WeakDown => "WEAK_DOWN",
            Trend::StrongDown => "STRONG_DOWN",
        }
    }

    /// Whether the trend points the same way as `direction`.
    pub fn is_aligned_with(&self, direction: Direction) -> bool {
        match direction {
            Direction::Call => matches!(self, Trend::StrongUp | Trend::WeakUp),
            Direction::Put => matches!(self, Trend::StrongDown | Trend::WeakDown),
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Time-of-day trading session bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketSession {
    Asian,
    London,
    Ny,
    OffHours,
}

impl MarketSession {
    /// Get display label for this session.
    pub fn label(&self) -> &'static str {
        match self {
            MarketSession::Asian => "ASIAN",
            MarketSession::London => "LONDON",
            MarketSession::Ny => "NY",
            MarketSession::OffHours => "OFF_HOURS",
        }
    }
}

impl fmt::Display for MarketSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the last close sits relative to the Bollinger envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandPosition {
    Lower,
    Middle,
    Upper,
}

impl BandPosition {
    /// Classify `price` against the lower and upper bands.
    pub fn classify(price: f64, lower: f64, upper: f64) -> Self {
        if price <= lower {
            BandPosition::Lower
        } else if price >= upper {
            BandPosition::Upper
        } else {
            BandPosition::Middle
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BandPosition::Lower => "LOWER",
            BandPosition::Middle => "MIDDLE",
            BandPosition::Upper => "UPPER",
        }
    }

    pub fn is_extreme(&self) -> bool {
        !matches!(self, BandPosition::Middle)
    }
}

/// Every indicator value derived in one evaluation pass over one symbol.
///
/// Values that could not be computed for lack of data are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    /// Last close of the evaluated window.
    pub price: f64,
    pub rsi: Option<f64>,
    pub ema: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub atr: Option<f64>,
    pub trend: Trend,
    pub session: MarketSession,
}

/// Rounded values carried for display and scoring.
///
/// Precision per field: RSI 1 decimal, prices and bands 5, MACD and ATR 6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayValues {
    pub rsi: f64,
    pub price: f64,
    pub ema: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    /// Zero when ATR was unavailable.
    pub atr: f64,
}

/// Round `value` to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// A directional candidate produced by signal derivation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalCandidate {
    pub symbol: String,
    pub direction: Direction,
    pub strength: SignalStrength,
    /// Entry price, rounded to 5 decimals.
    pub entry_price: f64,
    pub bb_position: BandPosition,
    pub snapshot: IndicatorSnapshot,
    pub display: DisplayValues,
    /// When the candidate was derived (process-local clock).
    pub timestamp: DateTime<Local>,
}

impl SignalCandidate {
    /// Wall-clock entry time, `HH:MM:SS`.
    pub fn entry_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// Deterministic active-set key for this candidate.
    pub fn signal_id(&self) -> String {
        signal_id(&self.symbol, &self.entry_time())
    }
}

/// Build the active-set key from a symbol and its `HH:MM:SS` entry time.
pub fn signal_id(symbol: &str, entry_time: &str) -> String {
    format!("{}_{}", symbol, entry_time.replace(':', ""))
}

/// Verdict of the quality scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Send,
    Reject,
}

/// Result of scoring one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub valid: bool,
    pub score: u32,
    pub max_score: u32,
    /// Human-readable reasons, in component order.
    pub issues: Vec<String>,
    pub recommendation: Recommendation,
}

impl Verification {
    pub fn new(score: u32, max_score: u32, min_score: u32, issues: Vec<String>) -> Self {
        let valid = score >= min_score;
        Self {
            valid,
            score,
            max_score,
            issues,
            recommendation: if valid {
                Recommendation::Send
            } else {
                Recommendation::Reject
            },
        }
    }

    /// Zero-score rejection used when scoring itself failed.
    pub fn error(max_score: u32) -> Self {
        Self {
            valid: false,
            score: 0,
            max_score,
            issues: vec!["verification error".to_string()],
            recommendation: Recommendation::Reject,
        }
    }
}

/// A candidate together with its verification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedSignal {
    pub candidate: SignalCandidate,
    pub verification: Verification,
}

/// A signal that passed every admission gate and awaits its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSignal {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    /// Wall-clock entry time, `HH:MM:SS`.
    pub entry_time: String,
    pub expiration_minutes: u32,
    /// Unix timestamp (seconds) when the signal was admitted.
    pub created_at: i64,
    /// Notification id used to thread the outcome as a reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_message_id: Option<MessageId>,
    pub quality_score: u32,
}

impl ActiveSignal {
    /// Seconds after admission at which the outcome can be verified.
    ///
    /// One extra minute past expiration lets the closing bar settle.
    pub fn resolution_delay_secs(&self) -> i64 {
        (self.expiration_minutes as i64 + 1) * 60
    }

    pub fn is_due(&self, now_ts: i64) -> bool {
        now_ts - self.created_at >= self.resolution_delay_secs()
    }

    /// Compare a verifying close against the entry price.
    pub fn outcome(&self, close_price: f64) -> SignalOutcome {
        let price_difference = close_price - self.entry_price;
        let win = match self.direction {
            Direction::Call => price_difference > 0.0,
            Direction::Put => price_difference < 0.0,
        };
        let percentage_change = if self.entry_price != 0.0 {
            price_difference / self.entry_price * 100.0
        } else {
            0.0
        };

        SignalOutcome {
            signal_id: self.id.clone(),
            symbol: self.symbol.clone(),
            direction: self.direction,
            entry_price: self.entry_price,
            close_price,
            price_difference,
            percentage_change,
            win,
        }
    }
}

/// Verified result of an expired signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalOutcome {
    pub signal_id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub close_price: f64,
    pub price_difference: f64,
    pub percentage_change: f64,
    pub win: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(direction: Direction, entry_price: f64) -> ActiveSignal {
        ActiveSignal {
            id: signal_id("EURUSD", "10:15:30"),
            symbol: "EURUSD".to_string(),
            direction,
            entry_price,
            entry_time: "10:15:30".to_string(),
            expiration_minutes: 1,
            created_at: 1_000,
            notification_message_id: None,
            quality_score: 9,
        }
    }

    #[test]
    fn test_signal_id_format() {
        assert_eq!(signal_id("EURUSD", "10:15:30"), "EURUSD_101530");
    }

    #[test]
    fn test_strength_labels_serialize() {
        let json = serde_json::to_string(&SignalStrength::MuitoForte).unwrap();
        assert_eq!(json, "\"MUITO FORTE\"");
        let json = serde_json::to_string(&SignalStrength::Medio).unwrap();
        assert_eq!(json, "\"MÉDIO\"");
        assert!(SignalStrength::Extrema > SignalStrength::Forte);
    }

    #[test]
    fn test_enum_labels_serialize() {
        assert_eq!(serde_json::to_string(&Direction::Call).unwrap(), "\"CALL\"");
        assert_eq!(
            serde_json::to_string(&Trend::StrongDown).unwrap(),
            "\"STRONG_DOWN\""
        );
        assert_eq!(
            serde_json::to_string(&MarketSession::OffHours).unwrap(),
            "\"OFF_HOURS\""
        );
        assert_eq!(
            serde_json::to_string(&Recommendation::Reject).unwrap(),
            "\"REJECT\""
        );
    }

    #[test]
    fn test_band_position_classify() {
        assert_eq!(BandPosition::classify(0.9, 1.0, 2.0), BandPosition::Lower);
        assert_eq!(BandPosition::classify(1.0, 1.0, 2.0), BandPosition::Lower);
        assert_eq!(BandPosition::classify(1.5, 1.0, 2.0), BandPosition::Middle);
        assert_eq!(BandPosition::classify(2.0, 1.0, 2.0), BandPosition::Upper);
        assert!(BandPosition::Upper.is_extreme());
        assert!(!BandPosition::Middle.is_extreme());
    }

    #[test]
    fn test_trend_alignment() {
        assert!(Trend::WeakUp.is_aligned_with(Direction::Call));
        assert!(Trend::StrongDown.is_aligned_with(Direction::Put));
        assert!(!Trend::Sideways.is_aligned_with(Direction::Call));
        assert!(!Trend::StrongUp.is_aligned_with(Direction::Put));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(23.456, 1), 23.5);
        assert_eq!(round_to(1.0816449, 5), 1.08164);
        assert_eq!(round_to(-0.0006023, 6), -0.000602);
    }

    #[test]
    fn test_verification_verdict() {
        let v = Verification::new(6, 17, 6, vec![]);
        assert!(v.valid);
        assert_eq!(v.recommendation, Recommendation::Send);

        let v = Verification::new(5, 17, 6, vec!["Low liquidity".to_string()]);
        assert!(!v.valid);
        assert_eq!(v.recommendation, Recommendation::Reject);
    }

    #[test]
    fn test_verification_error_shape() {
        let v = Verification::error(17);
        assert!(!v.valid);
        assert_eq!(v.score, 0);
        assert_eq!(v.issues, vec!["verification error".to_string()]);
    }

    #[test]
    fn test_active_signal_due_after_expiration_plus_one_minute() {
        let signal = active(Direction::Call, 1.1);
        assert!(!signal.is_due(1_000 + 119));
        assert!(signal.is_due(1_000 + 120));
    }

    #[test]
    fn test_outcome_call() {
        let signal = active(Direction::Call, 1.1);
        assert!(signal.outcome(1.1001).win);
        assert!(!signal.outcome(1.1).win);
        assert!(!signal.outcome(1.0999).win);
    }

    #[test]
    fn test_outcome_put() {
        let signal = active(Direction::Put, 1.1);
        let outcome = signal.outcome(1.0989);
        assert!(outcome.win);
        assert!(outcome.percentage_change < 0.0);
        assert!(!signal.outcome(1.1).win);
    }
}
