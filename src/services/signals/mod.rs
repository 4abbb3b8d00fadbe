//! Signal generation and verification.
//!
//! Indicators feed the deriver, which proposes a candidate per pair; the
//! quality scorer grades it and the lifecycle manager decides admission and
//! later resolves it against the market.

pub mod derivation;
pub mod engine;
pub mod format;
pub mod indicators;
pub mod lifecycle;
pub mod market;
pub mod quality;
pub mod runner;

pub use derivation::SignalDeriver;
pub use engine::{CycleReport, SignalEngine};
pub use lifecycle::{LifecycleManager, Rejection};
pub use quality::{QualityScorer, ScoreWeights};
pub use runner::SignalRunner;
