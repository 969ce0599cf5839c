//! Measure application
//!
//! Produces derived curve contexts; loss computation stays in the impact engine.

use crate::error::{Result, RiskError};
use crate::vulnerability::{VulnerabilityCurve, VulnerabilityCurveSet};

use super::{CurveOverride, MeasureDefinition, TargetCurve};

/// Curve context for one measure evaluated against the baseline
#[derive(Debug, Clone)]
pub struct AppliedMeasure {
    pub name: String,
    pub cost: f64,
    pub curves: VulnerabilityCurveSet,
    pub curve_override: CurveOverride,
}

/// Shared curve context for a batch of compatible measures
#[derive(Debug, Clone)]
pub struct AppliedBatch {
    pub names: Vec<String>,
    pub curves: VulnerabilityCurveSet,
    pub overrides: Vec<CurveOverride>,
}

/// Stateless measure transformations
pub struct MeasureEngine;

impl MeasureEngine {
    /// Apply one measure to the baseline curve set.
    ///
    /// The returned set contains every baseline curve plus the measure's
    /// target curve. The baseline set is not modified.
    pub fn apply(
        measure: &MeasureDefinition,
        baseline: &VulnerabilityCurveSet,
    ) -> Result<AppliedMeasure> {
        measure.validate()?;

        let curves = match Self::target_curve(measure, baseline)? {
            Some(target) => baseline.clone().with_curve(target),
            None => baseline.clone(),
        };

        log::debug!(
            "measure '{}': {}/{} -> {}",
            measure.name,
            measure.hazard_type,
            measure.source_id,
            measure.target_id
        );

        Ok(AppliedMeasure {
            name: measure.name.clone(),
            cost: measure.cost,
            curves,
            curve_override: measure.curve_override(),
        })
    }

    /// Apply several measures into one shared curve context.
    ///
    /// Fails with `MeasureConflict` when two measures remap the same source
    /// curve differently or write different curves under the same target id.
    /// Use [`MeasureEngine::partition`] to split such lists.
    pub fn apply_batch(
        measures: &[MeasureDefinition],
        baseline: &VulnerabilityCurveSet,
    ) -> Result<AppliedBatch> {
        for (i, first) in measures.iter().enumerate() {
            if let Some(second) = measures[i + 1..].iter().find(|m| !first.compatible_with(m)) {
                return Err(RiskError::MeasureConflict {
                    hazard_type: second.hazard_type.clone(),
                    source_id: second.source_id,
                    first: first.name.clone(),
                    second: second.name.clone(),
                });
            }
        }

        let mut curves = baseline.clone();
        let mut overrides: Vec<CurveOverride> = Vec::new();
        for measure in measures {
            measure.validate()?;
            if let Some(target) = Self::target_curve(measure, baseline)? {
                curves = curves.with_curve(target);
            }
            let directive = measure.curve_override();
            if !overrides.contains(&directive) {
                overrides.push(directive);
            }
        }

        Ok(AppliedBatch {
            names: measures.iter().map(|m| m.name.clone()).collect(),
            curves,
            overrides,
        })
    }

    /// Greedily split measures into batches of mutually compatible measures,
    /// preserving input order within each batch
    pub fn partition(measures: &[MeasureDefinition]) -> Vec<Vec<&MeasureDefinition>> {
        let mut batches: Vec<Vec<&MeasureDefinition>> = Vec::new();
        for measure in measures {
            match batches
                .iter_mut()
                .find(|batch| batch.iter().all(|m| m.compatible_with(measure)))
            {
                Some(batch) => batch.push(measure),
                None => batches.push(vec![measure]),
            }
        }
        batches
    }

    /// Curve to insert for this measure, or `None` when the target is
    /// already registered.
    ///
    /// A derived target may not replace a different baseline curve, since
    /// assets assigned to that id natively would silently change too.
    fn target_curve(
        measure: &MeasureDefinition,
        baseline: &VulnerabilityCurveSet,
    ) -> Result<Option<VulnerabilityCurve>> {
        let hazard_type = &measure.hazard_type;

        let derived = match &measure.target {
            TargetCurve::Registered => {
                baseline.lookup(hazard_type, measure.target_id)?;
                return Ok(None);
            }
            TargetCurve::ScaledMdd { mdd_factor } => {
                let source = baseline.lookup(hazard_type, measure.source_id)?;
                source
                    .scale(*mdd_factor)?
                    .relabel(measure.target_id, format!("{} ({})", source.name(), measure.name))
            }
            TargetCurve::Provided { curve } => curve.clone(),
        };

        let replaces_other = measure.target_id != measure.source_id
            && baseline
                .lookup(hazard_type, measure.target_id)
                .is_ok_and(|existing| !same_table(existing, &derived));
        if replaces_other {
            return Err(RiskError::InvalidMeasure {
                name: measure.name.clone(),
                reason: format!(
                    "target id {}/{} already holds a different baseline curve",
                    hazard_type, measure.target_id
                ),
            });
        }

        Ok(Some(derived))
    }
}

fn same_table(a: &VulnerabilityCurve, b: &VulnerabilityCurve) -> bool {
    a.intensity() == b.intensity() && a.paa() == b.paa() && a.mdd() == b.mdd()
}
