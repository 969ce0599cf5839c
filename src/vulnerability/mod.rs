//! Vulnerability (impact) curves mapping hazard intensity to damage ratio

mod curve;
mod set;

pub use curve::VulnerabilityCurve;
pub use set::VulnerabilityCurveSet;
