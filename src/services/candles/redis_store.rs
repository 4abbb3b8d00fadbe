use super::CandleSource;
use crate::error::AppError;
use crate::types::Candle;
use redis::aio::ConnectionManager;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Candles stored per symbol in a Redis sorted set scored by timestamp.
///
/// Key: `{prefix}{SYMBOL}`. Members are JSON candles.
pub struct RedisCandleStore {
    key_prefix: String,
    redis: RwLock<Option<ConnectionManager>>,
}

impl RedisCandleStore {
    pub fn new(key_prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            redis: RwLock::new(None),
        }
    }

    /// Connect to Redis. Reads fail with `SourceUnavailable` until this succeeds.
    pub async fn connect_redis(&self, redis_url: &str) {
        match redis::Client::open(redis_url) {
            Ok(client) => match ConnectionManager::new(client).await {
                Ok(conn) => {
                    info!("RedisCandleStore connected to Redis");
                    *self.redis.write().await = Some(conn);
                }
                Err(e) => {
                    warn!("Failed to connect RedisCandleStore to Redis: {}", e);
                }
            },
            Err(e) => {
                warn!("Invalid Redis URL for RedisCandleStore: {}", e);
            }
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.redis.read().await.is_some()
    }

    fn key(&self, symbol: &str) -> String {
        format!("{}{}", self.key_prefix, symbol.to_uppercase())
    }

    /// Parse newest-first members into an oldest-first series, skipping bad ones.
    fn parse_members(symbol: &str, members: &[String]) -> Vec<Candle> {
        let mut candles: Vec<Candle> = members
            .iter()
            .filter_map(|raw| match serde_json::from_str::<Candle>(raw) {
                Ok(candle) => Some(candle),
                Err(e) => {
                    warn!("Skipping malformed candle for {}: {}", symbol, e);
                    None
                }
            })
            .collect();
        candles.reverse();
        candles
    }
}

impl CandleSource for RedisCandleStore {
    fn name(&self) -> &str {
        "redis"
    }

    fn read_recent<'a>(
        &'a self,
        symbol: &'a str,
        count: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candle>, AppError>> + Send + 'a>> {
        Box::pin(async move {
            if count == 0 {
                return Ok(Vec::new());
            }

            let conn_guard = self.redis.read().await;
            let Some(ref conn) = *conn_guard else {
                return Err(AppError::SourceUnavailable(
                    "candle store is not connected".to_string(),
                ));
            };
            let mut conn = conn.clone();
            drop(conn_guard);

            let key = self.key(symbol);
            let members: Vec<String> = redis::cmd("ZREVRANGE")
                .arg(&key)
                .arg(0)
                .arg(count as isize - 1)
                .query_async(&mut conn)
                .await?;

            let candles = Self::parse_members(symbol, &members);
            debug!("Read {} candles for {}", candles.len(), symbol);
            Ok(candles)
        })
    }
}
