use super::engine::SignalEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Drives the engine on a fixed poll interval until stopped.
pub struct SignalRunner {
    engine: Arc<SignalEngine>,
    poll_interval: Duration,
    /// Wait after a cycle skipped outside the liquidity window.
    low_liquidity_backoff: Duration,
    /// Latched shutdown flag; receivers see it even if set before they subscribe.
    shutdown_tx: watch::Sender<bool>,
    running: AtomicBool,
}

impl SignalRunner {
    pub fn new(
        engine: Arc<SignalEngine>,
        poll_interval: Duration,
        low_liquidity_backoff: Duration,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);

        Arc::new(Self {
            engine,
            poll_interval,
            low_liquidity_backoff,
            shutdown_tx,
            running: AtomicBool::new(false),
        })
    }

    pub fn engine(&self) -> &Arc<SignalEngine> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run cycles until [`stop`](Self::stop) is called.
    ///
    /// A cycle in progress always completes; shutdown is observed between cycles.
    /// Returns at once if the runner was already stopped.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Signal runner already running");
            return;
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        info!(
            "Signal runner started ({} pairs, every {}s)",
            self.engine.settings().pairs.len(),
            self.poll_interval.as_secs()
        );

        loop {
            let stopped = *shutdown_rx.borrow_and_update();
            if stopped {
                info!("Signal runner received shutdown signal");
                break;
            }

            let report = self.engine.run_cycle().await;
            let wait = if report.skipped_low_liquidity {
                self.low_liquidity_backoff
            } else {
                self.poll_interval
            };

            tokio::select! {
                _ = sleep(wait) => {}
                _ = shutdown_rx.changed() => {}
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    /// Signal the loop to exit. Safe to call more than once, and before `start`.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalSettings;
    use crate::services::candles::MemoryCandleStore;
    use crate::services::notifier::MemoryNotifier;

    fn runner() -> Arc<SignalRunner> {
        let mut settings = SignalSettings::default();
        settings.pairs = vec!["EURUSD".to_string()];
        settings.advanced.market_session_filter = false;

        let engine = Arc::new(SignalEngine::new(
            settings,
            Arc::new(MemoryCandleStore::new()),
            Arc::new(MemoryNotifier::new()),
        ));
        SignalRunner::new(engine, Duration::from_secs(60), Duration::from_secs(300))
    }

    #[test]
    fn test_not_running_before_start() {
        let runner = runner();
        assert!(!runner.is_running());
        runner.stop();
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_stop_before_start_is_honoured() {
        let runner = runner();
        runner.stop();

        tokio::time::timeout(Duration::from_millis(500), runner.start())
            .await
            .expect("runner ignored an earlier stop");
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_stop_racing_spawn() {
        let runner = runner();
        let handle = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.start().await })
        };
        // The task may not have been polled yet
        runner.stop();

        tokio::time::timeout(Duration::from_millis(500), handle)
            .await
            .expect("runner did not stop")
            .unwrap();
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let runner = runner();
        let handle = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.start().await })
        };

        for _ in 0..50 {
            if runner.is_running() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert!(runner.is_running());

        // Give the first cycle time to reach the wait
        sleep(Duration::from_millis(50)).await;
        runner.stop();
        runner.stop();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("runner did not stop")
            .unwrap();
        assert!(!runner.is_running());
    }
}
