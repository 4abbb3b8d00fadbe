pub mod candles;
pub mod notifier;
pub mod signals;

pub use candles::{CandleSource, MemoryCandleStore, RedisCandleStore};
pub use notifier::{MemoryNotifier, Notifier, TelegramNotifier};
pub use signals::{SignalEngine, SignalRunner};
