use crate::error::{AppError, Result};
use crate::services::signals::derivation::MIN_CANDLES;
use crate::services::signals::quality::ScoreWeights;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

/// Telegram Bot API credentials.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub bot_token: String,
    /// Target chat id (numeric id or `@channel`).
    pub chat_id: String,
}

/// Process configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Status API host address.
    pub host: String,
    /// Status API port.
    pub port: u16,
    /// Redis URL of the candle store.
    pub redis_url: String,
    /// Key prefix of the per-symbol candle sorted sets.
    pub candle_key_prefix: String,
    /// Telegram credentials, if both token and chat id are set.
    pub telegram: Option<TelegramConfig>,
    /// Route notifications to the in-memory sink instead of Telegram.
    pub dry_run: bool,
    /// Path to the JSON signal settings file.
    pub settings_path: String,
    /// Seconds between evaluation cycles.
    pub poll_interval_secs: u64,
    /// Seconds to wait after a cycle skipped for low liquidity.
    pub low_liquidity_backoff_secs: u64,
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .ok()
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let telegram = match (
            env::var("TELEGRAM_BOT_TOKEN").ok().filter(|v| !v.is_empty()),
            env::var("TELEGRAM_CHAT_ID").ok().filter(|v| !v.is_empty()),
        ) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3002),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            candle_key_prefix: env::var("CANDLE_KEY_PREFIX")
                .unwrap_or_else(|_| "candles:".to_string()),
            telegram,
            dry_run: env_flag("DRY_RUN"),
            settings_path: env::var("SIGNALS_CONFIG")
                .unwrap_or_else(|_| "config.json".to_string()),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(45),
            low_liquidity_backoff_secs: env::var("LOW_LIQUIDITY_BACKOFF_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Fail fast on missing credentials.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.is_none() && !self.dry_run {
            return Err(AppError::Config(
                "TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID are required unless DRY_RUN is set"
                    .to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "POLL_INTERVAL_SECS must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Indicator periods, thresholds and admission timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// EMA period used by the directional rule.
    pub ma_period: usize,
    /// Minimum seconds between admitted signals on one symbol.
    pub signal_cooldown: u64,
    pub expiration_minutes: u32,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_deviation: f64,
    pub atr_period: usize,
    pub min_quality_score: u32,
    pub volatility_filter: bool,
    pub trend_filter: bool,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 25.0,
            rsi_overbought: 75.0,
            ma_period: 21,
            signal_cooldown: 180,
            expiration_minutes: 1,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_deviation: 2.0,
            atr_period: 14,
            min_quality_score: 6,
            volatility_filter: true,
            trend_filter: true,
        }
    }
}

/// Session filtering, rate limiting and notification behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    pub adaptive_rsi: bool,
    /// Accepted for compatibility with existing settings files; has no effect.
    pub multi_timeframe: bool,
    pub market_session_filter: bool,
    /// Cap on active signals per symbol created in the trailing hour (0 disables).
    pub max_signals_per_hour: u32,
    /// Hours of day during which no candidates are derived.
    pub blackout_hours: Vec<u32>,
    /// Hour of day at or after which a new day's report is sent.
    pub daily_report_hour: u32,
    /// Candles read per evaluation.
    pub candle_window: usize,
    /// Candles read when verifying an outcome.
    pub resolution_window: usize,
    pub notify_rejections: bool,
    /// Append the outcome to the original signal message.
    pub edit_on_resolution: bool,
    pub gale_multiplier: f64,
    pub gale_base_stake: f64,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            adaptive_rsi: true,
            multi_timeframe: true,
            market_session_filter: true,
            max_signals_per_hour: 3,
            blackout_hours: vec![22, 23, 0, 1, 2, 3, 4, 5],
            daily_report_hour: 0,
            candle_window: 100,
            resolution_window: 5,
            notify_rejections: false,
            edit_on_resolution: false,
            gale_multiplier: 2.2,
            gale_base_stake: 1.0,
        }
    }
}

/// Operator-facing signal settings file.
///
/// Every key is optional; missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    pub pairs: Vec<String>,
    pub gale_levels: Vec<String>,
    pub settings: IndicatorSettings,
    pub advanced: AdvancedSettings,
    pub scoring: ScoreWeights,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            pairs: ["EURUSD", "GBPUSD", "USDJPY", "AUDCAD", "USDCAD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            gale_levels: ["G0", "G1", "G2"].iter().map(|s| s.to_string()).collect(),
            settings: IndicatorSettings::default(),
            advanced: AdvancedSettings::default(),
            scoring: ScoreWeights::default(),
        }
    }
}

impl SignalSettings {
    /// Parse settings JSON, merging over defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Config(format!("invalid signal settings: {}", e)))
    }

    /// Load settings from `path`, or defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Settings file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings = Self::from_json(&raw)?;
        info!("Loaded signal settings from {}", path.display());
        Ok(settings)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;
        if self.pairs.is_empty() {
            return Err(AppError::Config("pairs must not be empty".to_string()));
        }
        if s.rsi_period == 0
            || s.ma_period == 0
            || s.macd_fast == 0
            || s.macd_signal == 0
            || s.bb_period == 0
            || s.atr_period == 0
        {
            return Err(AppError::Config(
                "indicator periods must be positive".to_string(),
            ));
        }
        if s.macd_fast >= s.macd_slow {
            return Err(AppError::Config(format!(
                "macd_fast ({}) must be below macd_slow ({})",
                s.macd_fast, s.macd_slow
            )));
        }
        if s.rsi_oversold >= s.rsi_overbought {
            return Err(AppError::Config(format!(
                "rsi_oversold ({}) must be below rsi_overbought ({})",
                s.rsi_oversold, s.rsi_overbought
            )));
        }
        if !s.bb_deviation.is_finite() || s.bb_deviation < 0.0 {
            return Err(AppError::Config(format!(
                "bb_deviation ({}) must be a non-negative number",
                s.bb_deviation
            )));
        }
        if self.advanced.candle_window < MIN_CANDLES {
            return Err(AppError::Config(format!(
                "candle_window ({}) must be at least {}",
                self.advanced.candle_window, MIN_CANDLES
            )));
        }
        if self.advanced.resolution_window == 0 {
            return Err(AppError::Config(
                "resolution_window must be positive".to_string(),
            ));
        }
        if let Some(hour) = self.advanced.blackout_hours.iter().find(|h| **h > 23) {
            return Err(AppError::Config(format!("invalid blackout hour {}", hour)));
        }
        if self.advanced.daily_report_hour > 23 {
            return Err(AppError::Config(format!(
                "invalid daily_report_hour {}",
                self.advanced.daily_report_hour
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3002,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            candle_key_prefix: "candles:".to_string(),
            telegram: None,
            dry_run: false,
            settings_path: "config.json".to_string(),
            poll_interval_secs: 45,
            low_liquidity_backoff_secs: 300,
        }
    }

    // =========================================================================
    // Config Tests
    // =========================================================================

    #[test]
    fn test_missing_credentials_rejected() {
        let err = config().validate().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_dry_run_without_credentials_accepted() {
        let mut config = config();
        config.dry_run = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credentials_accepted() {
        let mut config = config();
        config.telegram = Some(TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: "-100200".to_string(),
        });
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // SignalSettings Tests
    // =========================================================================

    #[test]
    fn test_settings_defaults() {
        let settings = SignalSettings::default();
        assert_eq!(settings.pairs.len(), 5);
        assert_eq!(settings.settings.rsi_oversold, 25.0);
        assert_eq!(settings.settings.rsi_overbought, 75.0);
        assert_eq!(settings.settings.ma_period, 21);
        assert_eq!(settings.settings.signal_cooldown, 180);
        assert_eq!(settings.settings.min_quality_score, 6);
        assert_eq!(settings.advanced.max_signals_per_hour, 3);
        assert!(settings.advanced.blackout_hours.contains(&23));
        assert!(!settings.advanced.blackout_hours.contains(&10));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let json = r#"{
            "pairs": ["EURUSD"],
            "settings": { "rsi_oversold": 30, "signal_cooldown": 0 },
            "advanced": { "blackout_hours": [] }
        }"#;
        let settings = SignalSettings::from_json(json).unwrap();

        assert_eq!(settings.pairs, vec!["EURUSD".to_string()]);
        assert_eq!(settings.settings.rsi_oversold, 30.0);
        assert_eq!(settings.settings.signal_cooldown, 0);
        // Untouched keys keep their defaults
        assert_eq!(settings.settings.rsi_overbought, 75.0);
        assert_eq!(settings.settings.macd_slow, 26);
        assert!(settings.advanced.adaptive_rsi);
        assert!(settings.advanced.blackout_hours.is_empty());
        assert_eq!(settings.gale_levels.len(), 3);
        assert_eq!(settings.scoring.max_score(), 17);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = SignalSettings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let settings = SignalSettings::load("/nonexistent/vigil/config.json").unwrap();
        assert_eq!(settings, SignalSettings::default());
    }

    #[test]
    fn test_inconsistent_settings_rejected() {
        let mut settings = SignalSettings::default();
        settings.settings.macd_fast = 30;
        assert!(settings.validate().is_err());

        let mut settings = SignalSettings::default();
        settings.settings.rsi_oversold = 80.0;
        assert!(settings.validate().is_err());

        let mut settings = SignalSettings::default();
        settings.pairs.clear();
        assert!(settings.validate().is_err());

        let mut settings = SignalSettings::default();
        settings.advanced.blackout_hours = vec![24];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_windows_and_deviation_rejected() {
        let mut settings = SignalSettings::default();
        settings.advanced.candle_window = 59;
        assert!(settings.validate().is_err());
        settings.advanced.candle_window = 60;
        assert!(settings.validate().is_ok());

        let mut settings = SignalSettings::default();
        settings.advanced.resolution_window = 0;
        assert!(settings.validate().is_err());

        let mut settings = SignalSettings::default();
        settings.settings.bb_deviation = -2.0;
        assert!(settings.validate().is_err());
        settings.settings.bb_deviation = f64::NAN;
        assert!(settings.validate().is_err());
        settings.settings.bb_deviation = 0.0;
        assert!(settings.validate().is_ok());
    }
}
