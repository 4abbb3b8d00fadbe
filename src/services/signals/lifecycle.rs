//! Active-signal bookkeeping: admission gates, resolution and daily stats.

use crate::config::SignalSettings;
use crate::types::{
    ActiveSignal, EvaluatedSignal, MessageId, PerformanceStats, SignalOutcome,
};
use chrono::{DateTime, Local, NaiveDate, Timelike};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, info};

/// Trailing window for the per-symbol rate limit.
const RATE_WINDOW_SECS: i64 = 3600;

/// Why a candidate was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("rate limited: {recent} signals in the last hour (cap {cap})")]
    RateLimited { recent: usize, cap: u32 },

    #[error("cooldown: {remaining_secs}s remaining")]
    Cooldown { remaining_secs: i64 },

    #[error("quality score {score}/{max_score} below minimum")]
    LowQuality { score: u32, max_score: u32 },

    #[error("signal {0} is already active")]
    Duplicate(String),
}

/// Owns the active set, cooldown trackers and the rolling stats window.
///
/// Not internally synchronised; the engine holds it behind one mutex.
#[derive(Debug)]
pub struct LifecycleManager {
    max_signals_per_hour: u32,
    cooldown_secs: i64,
    expiration_minutes: u32,
    daily_report_hour: u32,
    active: BTreeMap<String, ActiveSignal>,
    /// Unix seconds of the last admitted signal per symbol. Survives resolution.
    last_emitted: HashMap<String, i64>,
    stats: PerformanceStats,
    last_report_day: Option<NaiveDate>,
}

impl LifecycleManager {
    pub fn new(settings: &SignalSettings) -> Self {
        Self {
            max_signals_per_hour: settings.advanced.max_signals_per_hour,
            cooldown_secs: settings.settings.signal_cooldown as i64,
            expiration_minutes: settings.settings.expiration_minutes,
            daily_report_hour: settings.advanced.daily_report_hour,
            active: BTreeMap::new(),
            last_emitted: HashMap::new(),
            stats: PerformanceStats::default(),
            last_report_day: None,
        }
    }

    /// Active signals for `symbol` created within the trailing hour.
    pub fn recent_count(&self, symbol: &str, now_ts: i64) -> usize {
        self.active
            .values()
            .filter(|s| s.symbol == symbol && now_ts - s.created_at < RATE_WINDOW_SECS)
            .count()
    }

    /// Gate 1: per-symbol hourly cap. A cap of 0 disables it.
    pub fn check_rate_limit(&self, symbol: &str, now_ts: i64) -> Result<(), Rejection> {
        if self.max_signals_per_hour == 0 {
            return Ok(());
        }

        let recent = self.recent_count(symbol, now_ts);
        if recent >= self.max_signals_per_hour as usize {
            return Err(Rejection::RateLimited {
                recent,
                cap: self.max_signals_per_hour,
            });
        }
        Ok(())
    }

    /// Gate 2: spacing since the symbol's last admitted signal.
    pub fn check_cooldown(&self, symbol: &str, now_ts: i64) -> Result<(), Rejection> {
        let Some(last) = self.last_emitted.get(symbol) else {
            return Ok(());
        };

        let elapsed = now_ts - last;
        if elapsed < self.cooldown_secs {
            return Err(Rejection::Cooldown {
                remaining_secs: self.cooldown_secs - elapsed,
            });
        }
        Ok(())
    }

    /// Run every admission gate in order: rate limit, cooldown, quality.
    pub fn check_admission(&self, signal: &EvaluatedSignal, now_ts: i64) -> Result<(), Rejection> {
        let candidate = &signal.candidate;
        self.check_rate_limit(&candidate.symbol, now_ts)?;
        self.check_cooldown(&candidate.symbol, now_ts)?;

        let verification = &signal.verification;
        if !verification.valid {
            return Err(Rejection::LowQuality {
                score: verification.score,
                max_score: verification.max_score,
            });
        }

        let id = candidate.signal_id();
        if self.active.contains_key(&id) {
            return Err(Rejection::Duplicate(id));
        }
        Ok(())
    }

    /// Insert an admitted signal into the active set.
    ///
    /// Re-checks the gates so an invalid candidate can never become active.
    pub fn activate(
        &mut self,
        signal: &EvaluatedSignal,
        notification_message_id: Option<MessageId>,
        now_ts: i64,
    ) -> Result<ActiveSignal, Rejection> {
        self.check_admission(signal, now_ts)?;

        let candidate = &signal.candidate;
        let active = ActiveSignal {
            id: candidate.signal_id(),
            symbol: candidate.symbol.clone(),
            direction: candidate.direction,
            entry_price: candidate.entry_price,
            entry_time: candidate.entry_time(),
            expiration_minutes: self.expiration_minutes,
            created_at: now_ts,
            notification_message_id,
            quality_score: signal.verification.score,
        };

        self.last_emitted.insert(candidate.symbol.clone(), now_ts);
        self.active.insert(active.id.clone(), active.clone());
        info!(
            "Signal {} active ({} {} @ {:.5})",
            active.id, active.symbol, active.direction, active.entry_price
        );

        Ok(active)
    }

    /// Active signals whose expiration plus settle time has passed.
    pub fn due(&self, now_ts: i64) -> Vec<ActiveSignal> {
        self.active
            .values()
            .filter(|s| s.is_due(now_ts))
            .cloned()
            .collect()
    }

    /// Fold a verified outcome into the stats and drop the signal.
    ///
    /// Returns false, changing nothing, when the signal is not active.
    pub fn resolve(&mut self, outcome: &SignalOutcome) -> bool {
        if self.active.remove(&outcome.signal_id).is_none() {
            debug!("Signal {} already resolved", outcome.signal_id);
            return false;
        }

        self.stats.record_outcome(&outcome.symbol, outcome.win);
        info!(
            "Signal {} resolved: {} (entry {:.5}, close {:.5})",
            outcome.signal_id,
            if outcome.win { "WIN" } else { "LOSS" },
            outcome.entry_price,
            outcome.close_price
        );
        true
    }

    /// Whether a new day has started and the report hour has been reached.
    ///
    /// The first call only records the current day. Stays true until
    /// [`close_daily_window`](Self::close_daily_window) runs, so a report
    /// that failed to send is retried on the next check.
    pub fn daily_report_due(&mut self, now: DateTime<Local>) -> bool {
        let today = now.date_naive();
        let Some(last) = self.last_report_day else {
            self.last_report_day = Some(today);
            return false;
        };

        last != today && now.hour() >= self.daily_report_hour
    }

    /// Return the finished window's stats and start a fresh one as of `now`.
    pub fn close_daily_window(&mut self, now: DateTime<Local>) -> PerformanceStats {
        self.last_report_day = Some(now.date_naive());
        let report = std::mem::take(&mut self.stats);
        info!(
            "Daily window closed: {} signals, {:.1}% win rate",
            report.total_signals, report.win_rate
        );
        report
    }

    pub fn stats(&self) -> &PerformanceStats {
        &self.stats
    }

    pub fn active_signals(&self) -> Vec<ActiveSignal> {
        self.active.values().cloned().collect()
    }

    pub fn active_signal(&self, id: &str) -> Option<ActiveSignal> {
        self.active.get(id).cloned()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }
}
