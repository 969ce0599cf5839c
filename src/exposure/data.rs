//! Asset data structures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::hazard::HazardType;

/// A single exposed asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub latitude: f64,
    pub longitude: f64,

    /// Replacement value in the set's value unit
    pub value: f64,

    /// Vulnerability curve id by hazard type
    pub curve_ids: BTreeMap<HazardType, u32>,
}

impl Asset {
    pub fn new(latitude: f64, longitude: f64, value: f64) -> Self {
        Self {
            latitude,
            longitude,
            value,
            curve_ids: BTreeMap::new(),
        }
    }

    /// Assign the curve id used for the given hazard type
    pub fn with_curve(mut self, hazard_type: HazardType, curve_id: u32) -> Self {
        self.curve_ids.insert(hazard_type, curve_id);
        self
    }

    pub fn curve_id(&self, hazard_type: &HazardType) -> Option<u32> {
        self.curve_ids.get(hazard_type).copied()
    }
}

/// Ordered asset collection sharing a value unit and reference year
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AssetTable")]
pub struct AssetSet {
    assets: Vec<Asset>,
    ref_year: i32,
    value_unit: String,
}

#[derive(Deserialize)]
struct AssetTable {
    assets: Vec<Asset>,
    ref_year: i32,
    value_unit: String,
}

impl TryFrom<AssetTable> for AssetSet {
    type Error = RiskError;

    fn try_from(table: AssetTable) -> Result<Self> {
        Self::new(table.assets, table.ref_year, table.value_unit)
    }
}

impl AssetSet {
    /// Build an asset set, validating values and coordinates
    pub fn new(assets: Vec<Asset>, ref_year: i32, value_unit: impl Into<String>) -> Result<Self> {
        for (index, asset) in assets.iter().enumerate() {
            if !asset.value.is_finite() || asset.value < 0.0 {
                return Err(RiskError::InvalidAsset {
                    index,
                    reason: format!("value {} must be finite and non-negative", asset.value),
                });
            }
            if !(-90.0..=90.0).contains(&asset.latitude)
                || !(-180.0..=180.0).contains(&asset.longitude)
            {
                return Err(RiskError::InvalidAsset {
                    index,
                    reason: format!(
                        "coordinates ({}, {}) out of range",
                        asset.latitude, asset.longitude
                    ),
                });
            }
        }

        Ok(Self {
            assets,
            ref_year,
            value_unit: value_unit.into(),
        })
    }

    /// Assign `curve_id` for `hazard_type` to every asset that has no
    /// assignment for that hazard yet
    pub fn with_default_curve(mut self, hazard_type: &HazardType, curve_id: u32) -> Self {
        for asset in &mut self.assets {
            asset
                .curve_ids
                .entry(hazard_type.clone())
                .or_insert(curve_id);
        }
        self
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn ref_year(&self) -> i32 {
        self.ref_year
    }

    pub fn value_unit(&self) -> &str {
        &self.value_unit
    }

    /// Total exposed value
    pub fn total_value(&self) -> f64 {
        self.assets.iter().map(|a| a.value).sum()
    }
}
