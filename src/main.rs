use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil::config::{Config, SignalSettings};
use vigil::services::{
    CandleSource, MemoryNotifier, Notifier, RedisCandleStore, SignalEngine, SignalRunner,
    TelegramNotifier,
};
use vigil::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    config.validate()?;

    let settings = SignalSettings::load(&config.settings_path)?;
    settings.validate()?;
    if settings.advanced.multi_timeframe {
        info!("multi_timeframe is set but has no effect");
    }

    info!(
        "Starting Vigil on {}:{} ({} pairs)",
        config.host,
        config.port,
        settings.pairs.len()
    );

    // Candle store
    let candle_store = RedisCandleStore::new(&config.candle_key_prefix);
    candle_store.connect_redis(&config.redis_url).await;
    if !candle_store.is_connected().await {
        warn!("Candle store unavailable, cycles will find no data until Redis is reachable");
    }
    let candles: Arc<dyn CandleSource> = Arc::new(candle_store);

    // Notification sink
    let notifier: Arc<dyn Notifier> = match (&config.telegram, config.dry_run) {
        (Some(telegram), false) => Arc::new(TelegramNotifier::new(telegram)),
        _ => {
            info!("Dry run: notifications are logged only");
            Arc::new(MemoryNotifier::new())
        }
    };
    info!("Notifying via {}", notifier.name());

    let engine = Arc::new(SignalEngine::new(settings, candles, notifier));
    let runner = SignalRunner::new(
        engine.clone(),
        Duration::from_secs(config.poll_interval_secs),
        Duration::from_secs(config.low_liquidity_backoff_secs),
    );

    let runner_handle = {
        let runner = runner.clone();
        tokio::spawn(async move { runner.start().await })
    };

    let state = AppState {
        config: config.clone(),
        engine,
    };
    let app = api::app(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Vigil status API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await?;

    runner.stop();
    runner_handle.await?;

    Ok(())
}
