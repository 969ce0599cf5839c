//! Adaptation measures: cost plus a curve remapping for affected assets
//!
//! A measure never touches assets or the baseline curve set. Applying one
//! yields a derived curve set holding the measure's target curve and a
//! `CurveOverride` directive for the impact engine.

mod definition;
mod engine;

pub use definition::{CurveOverride, MeasureDefinition, TargetCurve};
pub use engine::{AppliedBatch, AppliedMeasure, MeasureEngine};
