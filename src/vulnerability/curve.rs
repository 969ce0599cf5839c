//! Tabulated vulnerability curve
//!
//! A curve is stored as intensity thresholds with two aligned columns:
//! - `paa`: probability that an asset is affected at that intensity
//! - `mdd`: mean damage degree of an affected asset
//!
//! The damage ratio is `paa(x) * mdd(x)`, both linearly interpolated between
//! thresholds and held flat outside the tabulated range.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::hazard::HazardType;

/// Default Emanuel (2011) USA calibration, m/s
const EMANUEL_V_THRESH: f64 = 25.7;
const EMANUEL_V_HALF: f64 = 74.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveTable")]
pub struct VulnerabilityCurve {
    hazard_type: HazardType,
    id: u32,
    name: String,
    intensity_unit: String,
    intensity: Vec<f64>,
    paa: Vec<f64>,
    mdd: Vec<f64>,
}

/// Serialized form; loading goes through `VulnerabilityCurve::new`
#[derive(Deserialize)]
struct CurveTable {
    hazard_type: HazardType,
    id: u32,
    name: String,
    #[serde(default = "default_intensity_unit")]
    intensity_unit: String,
    intensity: Vec<f64>,
    paa: Vec<f64>,
    mdd: Vec<f64>,
}

fn default_intensity_unit() -> String {
    "m/s".to_string()
}

impl TryFrom<CurveTable> for VulnerabilityCurve {
    type Error = RiskError;

    fn try_from(table: CurveTable) -> Result<Self> {
        let mut curve = Self::new(
            table.hazard_type,
            table.id,
            table.name,
            table.intensity,
            table.paa,
            table.mdd,
        )?;
        curve.intensity_unit = table.intensity_unit;
        Ok(curve)
    }
}

impl VulnerabilityCurve {
    /// Build and validate a curve.
    ///
    /// Fails with `InvalidCurve` when:
    /// - the table is empty or the columns have different lengths
    /// - intensity is not finite and strictly increasing
    /// - any paa/mdd value is outside [0, 1]
    pub fn new(
        hazard_type: HazardType,
        id: u32,
        name: impl Into<String>,
        intensity: Vec<f64>,
        paa: Vec<f64>,
        mdd: Vec<f64>,
    ) -> Result<Self> {
        let invalid = |reason: String| RiskError::InvalidCurve {
            hazard_type: hazard_type.clone(),
            id,
            reason,
        };

        if intensity.is_empty() {
            return Err(invalid("empty intensity axis".to_string()));
        }
        if paa.len() != intensity.len() || mdd.len() != intensity.len() {
            return Err(invalid(format!(
                "length mismatch: intensity {}, paa {}, mdd {}",
                intensity.len(),
                paa.len(),
                mdd.len()
            )));
        }
        if intensity.iter().any(|x| !x.is_finite()) {
            return Err(invalid("non-finite intensity threshold".to_string()));
        }
        if let Some(i) = intensity.windows(2).position(|w| w[1] <= w[0]) {
            return Err(invalid(format!(
                "intensity not strictly increasing at index {}",
                i + 1
            )));
        }
        for (label, column) in [("paa", &paa), ("mdd", &mdd)] {
            if let Some(v) = column.iter().find(|v| !(0.0..=1.0).contains(*v)) {
                return Err(invalid(format!("{} value {} outside [0, 1]", label, v)));
            }
        }

        Ok(Self {
            hazard_type,
            id,
            name: name.into(),
            intensity_unit: default_intensity_unit(),
            intensity,
            paa,
            mdd,
        })
    }

    /// Emanuel (2011) tropical-cyclone wind curve for US building stock.
    ///
    /// Tabulated on 0..=120 m/s in 5 m/s steps with paa = 1 and
    /// mdd = scale * v^3 / (1 + v^3), v = max(0, I - v_thresh) / (v_half - v_thresh).
    pub fn emanuel_usa(id: u32) -> Result<Self> {
        Self::emanuel(id, EMANUEL_V_THRESH, EMANUEL_V_HALF, 1.0)
    }

    /// Emanuel-type sigmoid with custom calibration
    pub fn emanuel(id: u32, v_thresh: f64, v_half: f64, scale: f64) -> Result<Self> {
        let hazard_type = HazardType::tropical_cyclone();
        if !(v_half > v_thresh) || !(0.0..=1.0).contains(&scale) {
            return Err(RiskError::InvalidCurve {
                hazard_type,
                id,
                reason: format!(
                    "Emanuel parameters v_thresh={} v_half={} scale={}",
                    v_thresh, v_half, scale
                ),
            });
        }

        let intensity: Vec<f64> = (0..=24).map(|step| step as f64 * 5.0).collect();
        let mdd = intensity
            .iter()
            .map(|&wind| {
                let v = (wind - v_thresh).max(0.0) / (v_half - v_thresh);
                let v3 = v.powi(3);
                scale * v3 / (1.0 + v3)
            })
            .collect();
        let paa = vec![1.0; intensity.len()];

        Self::new(hazard_type, id, "Emanuel 2011", intensity, paa, mdd)
    }

    pub fn hazard_type(&self) -> &HazardType {
        &self.hazard_type
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn intensity_unit(&self) -> &str {
        &self.intensity_unit
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn paa(&self) -> &[f64] {
        &self.paa
    }

    pub fn mdd(&self) -> &[f64] {
        &self.mdd
    }

    /// Interpolated probability of affection
    pub fn paa_at(&self, intensity: f64) -> f64 {
        interpolate(&self.intensity, &self.paa, intensity)
    }

    /// Interpolated mean damage degree
    pub fn mdd_at(&self, intensity: f64) -> f64 {
        interpolate(&self.intensity, &self.mdd, intensity)
    }

    /// Damage ratio in [0, 1] at the given intensity
    pub fn damage_ratio(&self, intensity: f64) -> f64 {
        (self.paa_at(intensity) * self.mdd_at(intensity)).clamp(0.0, 1.0)
    }

    /// Derive a curve with every mdd value multiplied by `mdd_factor` and
    /// clamped to [0, 1]. Intensity axis and paa are unchanged.
    pub fn scale(&self, mdd_factor: f64) -> Result<Self> {
        if !mdd_factor.is_finite() || mdd_factor < 0.0 {
            return Err(RiskError::InvalidCurve {
                hazard_type: self.hazard_type.clone(),
                id: self.id,
                reason: format!("mdd factor {} must be finite and non-negative", mdd_factor),
            });
        }

        Ok(Self {
            mdd: self
                .mdd
                .iter()
                .map(|m| (m * mdd_factor).clamp(0.0, 1.0))
                .collect(),
            ..self.clone()
        })
    }

    /// Same table under a different id and name
    pub fn relabel(&self, id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..self.clone()
        }
    }

    /// Whether paa and mdd never decrease with intensity, so that the damage
    /// ratio is non-decreasing too
    pub fn is_monotone(&self) -> bool {
        let non_decreasing = |column: &[f64]| column.windows(2).all(|w| w[1] >= w[0]);
        non_decreasing(&self.paa) && non_decreasing(&self.mdd)
    }
}

/// Piecewise-linear interpolation, flat beyond both ends of `xs`.
/// NaN maps to the first value; an empty table maps everything to zero.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let (Some(&x_first), Some(&x_last)) = (xs.first(), xs.last()) else {
        return 0.0;
    };
    let last = xs.len() - 1;
    if !(x > x_first) {
        return ys[0];
    }
    if x >= x_last {
        return ys[last];
    }

    // First threshold strictly above x; 1 <= upper <= last here
    let upper = xs.partition_point(|&t| t <= x);
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let (y0, y1) = (ys[upper - 1], ys[upper]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}
