//! Error type shared by every engine in the crate

use thiserror::Error;

use crate::hazard::HazardType;

/// Errors raised while building inputs or running a loss/benefit computation
#[derive(Debug, Error)]
pub enum RiskError {
    /// Malformed vulnerability curve, rejected at construction
    #[error("invalid vulnerability curve {hazard_type}/{id}: {reason}")]
    InvalidCurve {
        hazard_type: HazardType,
        id: u32,
        reason: String,
    },

    /// A resolved curve id is absent from the active curve set
    #[error("no vulnerability curve registered for {hazard_type}/{id}")]
    CurveNotFound { hazard_type: HazardType, id: u32 },

    /// Two measures in one batch remap the same source curve differently
    #[error(
        "measures '{first}' and '{second}' declare incompatible remaps of curve {hazard_type}/{source_id}"
    )]
    MeasureConflict {
        hazard_type: HazardType,
        source_id: u32,
        first: String,
        second: String,
    },

    /// The evaluation horizon reaches outside the discount schedule
    #[error(
        "discount schedule covers {covered_start}..={covered_end} but horizon needs {horizon_start}..={horizon_end}"
    )]
    DiscountScheduleGap {
        covered_start: i32,
        covered_end: i32,
        horizon_start: i32,
        horizon_end: i32,
    },

    #[error("invalid asset at index {index}: {reason}")]
    InvalidAsset { index: usize, reason: String },

    #[error("invalid event '{event_id}': {reason}")]
    InvalidEvent { event_id: String, reason: String },

    #[error("invalid measure '{name}': {reason}")]
    InvalidMeasure { name: String, reason: String },

    #[error("invalid discount schedule: {0}")]
    InvalidDiscountSchedule(String),

    #[error("invalid horizon {start_year}..={end_year}")]
    InvalidHorizon { start_year: i32, end_year: i32 },

    /// A measure loss was supplied without a matching cost entry
    #[error("no cost supplied for measure '{0}'")]
    MissingMeasureCost(String),

    #[error("failed to write table: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, RiskError>;
