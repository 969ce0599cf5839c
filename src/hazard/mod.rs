//! Hazard event sets: per-asset intensities and annual occurrence rates

mod event;

pub use event::{Event, EventSet, HazardType};
