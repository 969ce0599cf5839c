//! Keyed collection of vulnerability curves

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::hazard::HazardType;

use super::VulnerabilityCurve;

/// Immutable curve registry keyed by (hazard type, curve id).
///
/// Deriving a variant (for a measure) clones the set and inserts into the
/// copy; the source set is never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<VulnerabilityCurve>", into = "Vec<VulnerabilityCurve>")]
pub struct VulnerabilityCurveSet {
    curves: BTreeMap<(HazardType, u32), VulnerabilityCurve>,
}

impl From<Vec<VulnerabilityCurve>> for VulnerabilityCurveSet {
    fn from(curves: Vec<VulnerabilityCurve>) -> Self {
        Self::from_curves(curves)
    }
}

impl From<VulnerabilityCurveSet> for Vec<VulnerabilityCurve> {
    fn from(set: VulnerabilityCurveSet) -> Self {
        set.curves.into_values().collect()
    }
}

impl VulnerabilityCurveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from curves; a later curve with the same key replaces an earlier one
    pub fn from_curves(curves: impl IntoIterator<Item = VulnerabilityCurve>) -> Self {
        curves.into_iter().fold(Self::new(), |set, curve| set.with_curve(curve))
    }

    /// Insert or replace a curve, returning the extended set
    pub fn with_curve(mut self, curve: VulnerabilityCurve) -> Self {
        let key = (curve.hazard_type().clone(), curve.id());
        self.curves.insert(key, curve);
        self
    }

    /// Look up the curve registered for (hazard type, id)
    pub fn lookup(&self, hazard_type: &HazardType, id: u32) -> Result<&VulnerabilityCurve> {
        self.curves
            .get(&(hazard_type.clone(), id))
            .ok_or_else(|| RiskError::CurveNotFound {
                hazard_type: hazard_type.clone(),
                id,
            })
    }

    pub fn contains(&self, hazard_type: &HazardType, id: u32) -> bool {
        self.curves.contains_key(&(hazard_type.clone(), id))
    }

    /// Curve ids registered for a hazard type, ascending
    pub fn ids(&self, hazard_type: &HazardType) -> Vec<u32> {
        self.curves
            .keys()
            .filter(|(h, _)| h == hazard_type)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VulnerabilityCurve> {
        self.curves.values()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_type_and_id() {
        let tc = HazardType::tropical_cyclone();
        let base = VulnerabilityCurve::emanuel_usa(1).unwrap();
        let set = VulnerabilityCurveSet::from_curves([base.clone(), base.relabel(3, "copy")]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.lookup(&tc, 3).unwrap().name(), "copy");
        assert_eq!(set.ids(&tc), vec![1, 3]);

        let missing = set.lookup(&tc, 2);
        assert!(matches!(missing, Err(RiskError::CurveNotFound { id: 2, .. })));

        let other = set.lookup(&HazardType::new("FL"), 1);
        assert!(matches!(other, Err(RiskError::CurveNotFound { id: 1, .. })));
    }

    #[test]
    fn test_with_curve_leaves_source_untouched() {
        let tc = HazardType::tropical_cyclone();
        let base = VulnerabilityCurve::emanuel_usa(1).unwrap();
        let baseline = VulnerabilityCurveSet::from_curves([base.clone()]);

        let derived = baseline.clone().with_curve(base.scale(0.5).unwrap().relabel(2, "half"));

        assert!(derived.contains(&tc, 2));
        assert!(!baseline.contains(&tc, 2));
        assert_eq!(baseline.len(), 1);
    }

    #[test]
    fn test_json_as_curve_list() {
        let base = VulnerabilityCurve::emanuel_usa(1).unwrap();
        let set = VulnerabilityCurveSet::from_curves([base.clone(), base.relabel(2, "copy")]);

        let json = serde_json::to_string(&set).unwrap();
        assert!(json.starts_with('['));
        let parsed: VulnerabilityCurveSet = serde_json::from_str(&json).unwrap();
        let tc = HazardType::tropical_cyclone();
        assert_eq!(parsed.ids(&tc), vec![1, 2]);
        assert_eq!(parsed.lookup(&tc, 2).unwrap().name(), "copy");
    }

    #[test]
    fn test_json_with_invalid_curve_rejected() {
        let json = r#"[{"hazard_type": "TC", "id": 1, "name": "bad",
            "intensity": [40.0, 10.0], "paa": [1.5, 1.5], "mdd": [0.2, 0.4]}]"#;
        let error = serde_json::from_str::<VulnerabilityCurveSet>(json).unwrap_err();
        assert!(error.to_string().contains("invalid vulnerability curve TC/1"), "{}", error);
    }
}
