pub mod candle;
pub mod signals;
pub mod stats;

pub use candle::*;
pub use signals::*;
pub use stats::*;
