use super::CandleSource;
use crate::error::AppError;
use crate::types::Candle;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-process candle series keyed by symbol.
#[derive(Default)]
pub struct MemoryCandleStore {
    series: DashMap<String, Vec<Candle>>,
    failing: AtomicBool,
}

impl MemoryCandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the series for `symbol`.
    pub fn insert(&self, symbol: &str, candles: Vec<Candle>) {
        self.series.insert(symbol.to_uppercase(), candles);
    }

    /// Append one candle to the series for `symbol`.
    pub fn push(&self, symbol: &str, candle: Candle) {
        self.series
            .entry(symbol.to_uppercase())
            .or_default()
            .push(candle);
    }

    pub fn len(&self, symbol: &str) -> usize {
        self.series
            .get(&symbol.to_uppercase())
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Make every read fail with `SourceUnavailable` until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl CandleSource for MemoryCandleStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn read_recent<'a>(
        &'a self,
        symbol: &'a str,
        count: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candle>, AppError>> + Send + 'a>> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::SourceUnavailable(format!(
                    "memory store offline ({})",
                    symbol
                )));
            }

            let Some(series) = self.series.get(&symbol.to_uppercase()) else {
                return Ok(Vec::new());
            };
            let start = series.len().saturating_sub(count);
            Ok(series[start..].to_vec())
        })
    }
}
