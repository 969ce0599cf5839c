//! Measure definitions and curve override directives

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::hazard::HazardType;
use crate::vulnerability::VulnerabilityCurve;

/// Remap directive consumed by the impact engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveOverride {
    pub hazard_type: HazardType,
    pub source_id: u32,
    pub target_id: u32,
}

impl CurveOverride {
    pub fn new(hazard_type: HazardType, source_id: u32, target_id: u32) -> Self {
        Self {
            hazard_type,
            source_id,
            target_id,
        }
    }

    /// Target id if this override applies to `curve_id` under `hazard_type`
    pub fn remap(&self, hazard_type: &HazardType, curve_id: u32) -> Option<u32> {
        (self.hazard_type == *hazard_type && self.source_id == curve_id).then_some(self.target_id)
    }
}

/// Where a measure's target curve comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetCurve {
    /// Target id is already registered in the baseline curve set
    Registered,

    /// Source curve with mdd multiplied by `mdd_factor`
    ScaledMdd { mdd_factor: f64 },

    /// Explicit curve, registered under the target id
    Provided { curve: VulnerabilityCurve },
}

/// A named adaptation measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureDefinition {
    pub name: String,

    /// One-off implementation cost, in the exposure value unit
    pub cost: f64,

    pub hazard_type: HazardType,

    /// Curve id whose assets are remapped
    pub source_id: u32,

    /// Curve id they use under this measure
    pub target_id: u32,

    pub target: TargetCurve,
}

impl MeasureDefinition {
    pub fn new(
        name: impl Into<String>,
        cost: f64,
        hazard_type: HazardType,
        source_id: u32,
        target_id: u32,
        target: TargetCurve,
    ) -> Result<Self> {
        let measure = Self {
            name: name.into(),
            cost,
            hazard_type,
            source_id,
            target_id,
            target,
        };
        measure.validate()?;
        Ok(measure)
    }

    /// Measure whose target curve is the source curve with scaled mdd
    pub fn scaled(
        name: impl Into<String>,
        cost: f64,
        hazard_type: HazardType,
        source_id: u32,
        target_id: u32,
        mdd_factor: f64,
    ) -> Result<Self> {
        Self::new(
            name,
            cost,
            hazard_type,
            source_id,
            target_id,
            TargetCurve::ScaledMdd { mdd_factor },
        )
    }

    /// Check name, cost and target consistency.
    ///
    /// Deserialized measures bypass `new`, so the engine calls this again.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| RiskError::InvalidMeasure {
            name: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("empty name".to_string()));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(invalid(format!("cost {} must be finite and non-negative", self.cost)));
        }
        match &self.target {
            TargetCurve::Registered => {}
            TargetCurve::ScaledMdd { mdd_factor } => {
                if !mdd_factor.is_finite() || *mdd_factor < 0.0 {
                    return Err(invalid(format!("mdd factor {} is invalid", mdd_factor)));
                }
            }
            TargetCurve::Provided { curve } => {
                if curve.hazard_type() != &self.hazard_type || curve.id() != self.target_id {
                    return Err(invalid(format!(
                        "provided curve {}/{} does not match target {}/{}",
                        curve.hazard_type(),
                        curve.id(),
                        self.hazard_type,
                        self.target_id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Override directive for the impact engine
    pub fn curve_override(&self) -> CurveOverride {
        CurveOverride::new(self.hazard_type.clone(), self.source_id, self.target_id)
    }

    /// Whether this measure can share one derived curve set with `other`.
    ///
    /// Measures on the same source curve must agree on the target; measures
    /// writing the same target id must agree on the target curve.
    pub fn compatible_with(&self, other: &MeasureDefinition) -> bool {
        if self.hazard_type != other.hazard_type {
            return true;
        }
        let same_target = self.target_id == other.target_id && self.target == other.target;
        if self.source_id == other.source_id {
            return same_target;
        }
        if self.target_id == other.target_id {
            // Scaled targets from different sources are different curves
            return self.target == other.target
                && !matches!(self.target, TargetCurve::ScaledMdd { .. });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc() -> HazardType {
        HazardType::tropical_cyclone()
    }

    #[test]
    fn test_remap_matches_hazard_and_source() {
        let remap = CurveOverride::new(tc(), 1, 2);
        assert_eq!(remap.remap(&tc(), 1), Some(2));
        assert_eq!(remap.remap(&tc(), 3), None);
        assert_eq!(remap.remap(&HazardType::new("FL"), 1), None);
    }

    #[test]
    fn test_validation() {
        assert!(MeasureDefinition::scaled("Mangroves", 5e6, tc(), 1, 2, 0.8).is_ok());
        assert!(matches!(
            MeasureDefinition::scaled("Mangroves", -1.0, tc(), 1, 2, 0.8),
            Err(RiskError::InvalidMeasure { .. })
        ));
        assert!(MeasureDefinition::scaled(" ", 0.0, tc(), 1, 2, 0.8).is_err());
        assert!(MeasureDefinition::scaled("x", 0.0, tc(), 1, 2, f64::NAN).is_err());

        let curve = VulnerabilityCurve::emanuel_usa(4).unwrap();
        let mismatched = MeasureDefinition::new(
            "Custom",
            1.0,
            tc(),
            1,
            5,
            TargetCurve::Provided { curve },
        );
        assert!(matches!(mismatched, Err(RiskError::InvalidMeasure { .. })));
    }

    #[test]
    fn test_compatibility() {
        let mangroves = MeasureDefinition::scaled("Mangroves", 5e6, tc(), 1, 2, 0.8).unwrap();
        let retrofit = MeasureDefinition::scaled("Retrofitting", 1e8, tc(), 1, 3, 0.5).unwrap();
        let other_source = MeasureDefinition::scaled("Shutters", 1e6, tc(), 4, 5, 0.7).unwrap();
        let same_slot = MeasureDefinition::scaled("Roofs", 1e6, tc(), 4, 2, 0.8).unwrap();
        let flood = MeasureDefinition::scaled("Levee", 1e6, HazardType::new("FL"), 1, 3, 0.1).unwrap();

        assert!(!mangroves.compatible_with(&retrofit));
        assert!(mangroves.compatible_with(&other_source));
        assert!(mangroves.compatible_with(&flood));
        // Same target id but derived from different sources
        assert!(!mangroves.compatible_with(&same_slot));
        assert!(mangroves.compatible_with(&mangroves.clone()));
    }

    #[test]
    fn test_provided_curve_from_json_is_validated() {
        let measure = r#"{"name": "Custom", "cost": 1.0, "hazard_type": "TC",
            "source_id": 1, "target_id": 5,
            "target": {"kind": "provided", "curve": {"hazard_type": "TC", "id": 5,
                "name": "custom", "intensity": [], "paa": [], "mdd": []}}}"#;
        assert!(serde_json::from_str::<MeasureDefinition>(measure).is_err());

        let scaled = r#"{"name": "Shutters", "cost": 1.0, "hazard_type": "TC",
            "source_id": 1, "target_id": 5,
            "target": {"kind": "scaled_mdd", "mdd_factor": 0.7}}"#;
        let parsed: MeasureDefinition = serde_json::from_str(scaled).unwrap();
        assert_eq!(parsed.target, TargetCurve::ScaledMdd { mdd_factor: 0.7 });
    }
}
