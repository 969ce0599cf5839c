//! Impact computation: per-event and expected annual loss over an asset set

mod engine;
mod loss;

pub use engine::{ImpactConfig, ImpactEngine};
pub use loss::{ExceedanceCurve, LossDistribution};
