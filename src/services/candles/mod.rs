//! Candle sources.
//!
//! The engine only needs the newest `count` candles of a symbol, oldest first.

mod memory;
mod redis_store;

pub use memory::MemoryCandleStore;
pub use redis_store::RedisCandleStore;

use crate::error::AppError;
use crate::types::Candle;
use std::future::Future;
use std::pin::Pin;

/// Read access to a per-symbol candle series.
pub trait CandleSource: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// The most recent `count` candles for `symbol`, ordered oldest to newest.
    ///
    /// An unknown symbol yields an empty vector, not an error.
    fn read_recent<'a>(
        &'a self,
        symbol: &'a str,
        count: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candle>, AppError>> + Send + 'a>>;
}
