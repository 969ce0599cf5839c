//! Event and event set definitions
//!
//! Intensities are stored densely, one value per asset in the order of the
//! `AssetSet` the event set was materialized against. A zero, negative or NaN
//! intensity means the asset is not exposed to that event.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Hazard type tag shared by events, curves and measures (e.g. "TC")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HazardType(String);

impl HazardType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Tropical-cyclone wind
    pub fn tropical_cyclone() -> Self {
        Self::new("TC")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single hazard event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier (track name, storm id, ...)
    pub id: String,

    /// Intensity at each asset location (wind speed, m/s)
    pub intensity: Vec<f64>,

    /// Annual occurrence rate (events per year)
    pub frequency: f64,
}

impl Event {
    pub fn new(id: impl Into<String>, intensity: Vec<f64>, frequency: f64) -> Self {
        Self {
            id: id.into(),
            intensity,
            frequency,
        }
    }

    /// Intensity at the asset with the given index, or `None` when the asset
    /// is not exposed to this event
    pub fn intensity_at(&self, asset_index: usize) -> Option<f64> {
        match self.intensity.get(asset_index) {
            Some(&value) if value > 0.0 => Some(value),
            _ => None,
        }
    }
}

/// Ordered collection of events sharing one hazard type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "EventTable")]
pub struct EventSet {
    hazard_type: HazardType,
    events: Vec<Event>,
}

#[derive(Deserialize)]
struct EventTable {
    hazard_type: HazardType,
    events: Vec<Event>,
}

impl TryFrom<EventTable> for EventSet {
    type Error = RiskError;

    fn try_from(table: EventTable) -> Result<Self> {
        Self::new(table.hazard_type, table.events)
    }
}

impl EventSet {
    /// Build an event set, rejecting negative or non-finite frequencies
    pub fn new(hazard_type: HazardType, events: Vec<Event>) -> Result<Self> {
        for event in &events {
            if !event.frequency.is_finite() || event.frequency < 0.0 {
                return Err(RiskError::InvalidEvent {
                    event_id: event.id.clone(),
                    reason: format!("frequency {} is not a non-negative rate", event.frequency),
                });
            }
        }
        Ok(Self { hazard_type, events })
    }

    pub fn hazard_type(&self) -> &HazardType {
        &self.hazard_type
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of annual frequencies (not a probability; may exceed 1)
    pub fn total_frequency(&self) -> f64 {
        self.events.iter().map(|e| e.frequency).sum()
    }

    /// Check that every event carries exactly one intensity per asset
    pub fn check_shape(&self, asset_count: usize) -> Result<()> {
        for event in &self.events {
            if event.intensity.len() != asset_count {
                return Err(RiskError::InvalidEvent {
                    event_id: event.id.clone(),
                    reason: format!(
                        "{} intensity values for {} assets",
                        event.intensity.len(),
                        asset_count
                    ),
                });
            }
        }
        Ok(())
    }

    /// Uniform annual-rate fallback for historical event sets without frequencies.
    ///
    /// When every frequency is zero, each event is assigned 1 / (years observed).
    /// Sets that already carry any non-zero frequency are returned unchanged.
    /// This is for data collaborators preparing an event set; the engines
    /// never call it.
    pub fn with_uniform_frequency(mut self, first_year: i32, last_year: i32) -> Result<Self> {
        if last_year < first_year {
            return Err(RiskError::InvalidHorizon {
                start_year: first_year,
                end_year: last_year,
            });
        }

        if self.events.iter().any(|e| e.frequency != 0.0) {
            return Ok(self);
        }

        let years = (i64::from(last_year) - i64::from(first_year) + 1) as f64;
        log::info!(
            "assigning uniform frequency 1/{} to {} {} events",
            years,
            self.events.len(),
            self.hazard_type
        );
        for event in &mut self.events {
            event.frequency = 1.0 / years;
        }
        Ok(self)
    }
}
