//! One evaluation cycle: resolve, report, then evaluate every pair.

use super::derivation::SignalDeriver;
use super::format;
use super::lifecycle::{LifecycleManager, Rejection};
use super::market;
use crate::config::SignalSettings;
use crate::services::candles::CandleSource;
use crate::services::notifier::Notifier;
use crate::types::{ActiveSignal, PerformanceStats};
use chrono::{DateTime, Local, Timelike};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What a single cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    /// Active signals resolved and removed.
    pub resolved: usize,
    /// Candidates that became active.
    pub admitted: usize,
    /// Candidates refused by cooldown or quality.
    pub rejected: usize,
    /// Evaluation skipped outside the liquidity window.
    pub skipped_low_liquidity: bool,
    /// A daily report was sent.
    pub report_sent: bool,
}

enum PairOutcome {
    Admitted,
    Rejected,
    Nothing,
}

/// Signal engine. Owns the lifecycle state behind a single mutex so that at
/// most one cycle mutates it at a time.
pub struct SignalEngine {
    settings: SignalSettings,
    candles: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    deriver: SignalDeriver,
    state: Mutex<LifecycleManager>,
}

impl SignalEngine {
    pub fn new(
        settings: SignalSettings,
        candles: Arc<dyn CandleSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let deriver = SignalDeriver::new(&settings);
        let state = Mutex::new(LifecycleManager::new(&settings));

        Self {
            settings,
            candles,
            notifier,
            deriver,
            state,
        }
    }

    pub fn settings(&self) -> &SignalSettings {
        &self.settings
    }

    /// Snapshot of the current stats window.
    pub async fn stats(&self) -> PerformanceStats {
        self.state.lock().await.stats().clone()
    }

    /// Active signals ordered by id.
    pub async fn active_signals(&self) -> Vec<ActiveSignal> {
        self.state.lock().await.active_signals()
    }

    pub async fn active_signal(&self, id: &str) -> Option<ActiveSignal> {
        self.state.lock().await.active_signal(id)
    }

    /// Run a cycle against the local clock.
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(Local::now()).await
    }

    /// Run a cycle as of `now`.
    pub async fn run_cycle_at(&self, now: DateTime<Local>) -> CycleReport {
        let mut state = self.state.lock().await;
        let now_ts = now.timestamp();
        let mut report = CycleReport::default();

        debug!("Cycle at {}", now.format("%H:%M:%S"));

        report.resolved = self.resolve_due(&mut state, now_ts).await;
        report.report_sent = self.send_daily_report(&mut state, now).await;

        if self.settings.advanced.market_session_filter && !market::is_high_liquidity(now.hour())
        {
            info!(
                "Low liquidity hour ({}), skipping evaluation",
                market::session_at(&now)
            );
            report.skipped_low_liquidity = true;
            return report;
        }

        for pair in &self.settings.pairs {
            match self.evaluate_pair(&mut state, pair, now).await {
                PairOutcome::Admitted => report.admitted += 1,
                PairOutcome::Rejected => report.rejected += 1,
                PairOutcome::Nothing => {}
            }
        }

        let stats = state.stats();
        if !stats.is_empty() {
            info!(
                "Stats: {}/{} ({:.1}%)",
                stats.wins, stats.total_signals, stats.win_rate
            );
        }

        report
    }

    /// Verify every due signal. Fetch failures defer to the next cycle.
    async fn resolve_due(&self, state: &mut LifecycleManager, now_ts: i64) -> usize {
        let mut resolved = 0;

        for signal in state.due(now_ts) {
            let candles = match self
                .candles
                .read_recent(&signal.symbol, self.settings.advanced.resolution_window)
                .await
            {
                Ok(candles) => candles,
                Err(e) => {
                    warn!("Deferring {}: {}", signal.id, e);
                    continue;
                }
            };
            let Some(last) = candles.last() else {
                warn!("Deferring {}: no candles for {}", signal.id, signal.symbol);
                continue;
            };

            let outcome = signal.outcome(last.close);

            let text = format::result_message(&outcome);
            if let Err(e) = self
                .notifier
                .send(&text, signal.notification_message_id)
                .await
            {
                warn!("Failed to send result for {}: {}", signal.id, e);
            }

            if self.settings.advanced.edit_on_resolution {
                if let Some(message_id) = signal.notification_message_id {
                    let text = format::resolved_signal_message(&signal, &outcome);
                    if let Err(e) = self.notifier.edit(message_id, &text).await {
                        warn!("Failed to annotate {}: {}", signal.id, e);
                    }
                }
            }

            if state.resolve(&outcome) {
                resolved += 1;
            }
        }

        resolved
    }

    /// Send the daily report if the day rolled over.
    ///
    /// The window is closed only once the report is delivered (or there was
    /// nothing to report); a failed send keeps the stats for the next cycle.
    async fn send_daily_report(&self, state: &mut LifecycleManager, now: DateTime<Local>) -> bool {
        if !state.daily_report_due(now) {
            return false;
        }
        let Some(text) = format::daily_report(state.stats()) else {
            debug!("No resolved signals, skipping daily report");
            state.close_daily_window(now);
            return false;
        };

        match self.notifier.send(&text, None).await {
            Ok(_) => {
                state.close_daily_window(now);
                true
            }
            Err(e) => {
                warn!("Failed to send daily report, retrying next cycle: {}", e);
                false
            }
        }
    }

    async fn evaluate_pair(
        &self,
        state: &mut LifecycleManager,
        pair: &str,
        now: DateTime<Local>,
    ) -> PairOutcome {
        let now_ts = now.timestamp();

        if let Err(rejection) = state.check_rate_limit(pair, now_ts) {
            debug!("{}: {}", pair, rejection);
            return PairOutcome::Nothing;
        }

        let candles = match self
            .candles
            .read_recent(pair, self.settings.advanced.candle_window)
            .await
        {
            Ok(candles) => candles,
            Err(e) => {
                warn!("{}: candle read failed: {}", pair, e);
                return PairOutcome::Nothing;
            }
        };

        let Some(signal) = self.deriver.derive(pair, &candles, now) else {
            return PairOutcome::Nothing;
        };

        if let Err(rejection) = state.check_admission(&signal, now_ts) {
            match &rejection {
                Rejection::LowQuality { .. } => {
                    info!(
                        "{} {} rejected: score {}/{} {:?}",
                        pair,
                        signal.candidate.direction,
                        signal.verification.score,
                        signal.verification.max_score,
                        signal.verification.issues
                    );
                    if self.settings.advanced.notify_rejections {
                        let text = format::rejection_message(&signal);
                        if let Err(e) = self.notifier.send(&text, None).await {
                            warn!("Failed to send rejection for {}: {}", pair, e);
                        }
                    }
                }
                _ => info!("{}: {}", pair, rejection),
            }
            return PairOutcome::Rejected;
        }

        let text = format::signal_message(&signal, &self.settings);
        let message_id = match self.notifier.send(&text, None).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to send signal for {}: {}", pair, e);
                None
            }
        };

        match state.activate(&signal, message_id, now_ts) {
            Ok(_) => PairOutcome::Admitted,
            Err(rejection) => {
                warn!("{}: activation refused: {}", pair, rejection);
                PairOutcome::Rejected
            }
        }
    }
}
