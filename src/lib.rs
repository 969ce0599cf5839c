//! Cyclone Adapt - Tropical-cyclone wind loss and adaptation cost-benefit engine
//!
//! This library provides:
//! - Vulnerability curves (paa x mdd) with measure-specific derivations
//! - Impact computation: per-event loss and expected annual loss (EAL)
//! - Adaptation measures as pure curve-set transformations
//! - Discounted cost-benefit evaluation and deterministic measure ranking
//! - Flat CSV export of every output table

pub mod error;
pub mod hazard;
pub mod exposure;
pub mod vulnerability;
pub mod impact;
pub mod measures;
pub mod cost_benefit;
pub mod analysis;
pub mod tables;

// Re-export commonly used types
pub use error::{Result, RiskError};
pub use hazard::{Event, EventSet, HazardType};
pub use exposure::{Asset, AssetSet};
pub use vulnerability::{VulnerabilityCurve, VulnerabilityCurveSet};
pub use impact::{ImpactConfig, ImpactEngine, LossDistribution};
pub use measures::{CurveOverride, MeasureDefinition, MeasureEngine, TargetCurve};
pub use cost_benefit::{
    BenefitCostRatio, CostBenefitEngine, CostBenefitResult, CostBenefitSummary, DiscountSchedule,
    Horizon,
};
pub use analysis::{AdaptationAnalysis, AnalysisConfig, AnalysisReport};

/// Compute the baseline loss distribution of `assets` under `events`
pub fn compute_impact(
    assets: &AssetSet,
    events: &EventSet,
    curves: &VulnerabilityCurveSet,
) -> Result<LossDistribution> {
    ImpactEngine::default().compute(assets, events, curves, &[])
}

/// Derive the curve context for one measure
pub fn apply_measure(
    measure: &MeasureDefinition,
    curves: &VulnerabilityCurveSet,
) -> Result<(VulnerabilityCurveSet, CurveOverride)> {
    let applied = MeasureEngine::apply(measure, curves)?;
    Ok((applied.curves, applied.curve_override))
}

/// Evaluate measure losses against the baseline and rank the measures
pub fn evaluate_cost_benefit(
    baseline: &LossDistribution,
    measure_losses: &std::collections::BTreeMap<String, LossDistribution>,
    measure_costs: &std::collections::BTreeMap<String, f64>,
    schedule: &DiscountSchedule,
    horizon: &Horizon,
) -> Result<CostBenefitSummary> {
    CostBenefitEngine::evaluate(baseline, measure_losses, measure_costs, schedule, horizon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    #[test]
    fn test_facade_pipeline() {
        let tc = HazardType::tropical_cyclone();
        let assets = AssetSet::new(
            vec![Asset::new(25.8, -80.2, 1_000_000.0).with_curve(tc.clone(), 1)],
            2016,
            "USD",
        )
        .unwrap();
        let events = EventSet::new(tc.clone(), vec![Event::new("e1", vec![65.0], 0.05)]).unwrap();
        let curves = VulnerabilityCurveSet::from_curves([VulnerabilityCurve::emanuel_usa(1).unwrap()]);

        let baseline = compute_impact(&assets, &events, &curves).unwrap();

        let measure = MeasureDefinition::scaled("Retrofitting", 1_000.0, tc, 1, 3, 0.5).unwrap();
        let (derived, remap) = apply_measure(&measure, &curves).unwrap();
        let measure_loss = ImpactEngine::default()
            .compute(&assets, &events, &derived, &[remap])
            .unwrap();
        assert_relative_eq!(measure_loss.eal, 0.5 * baseline.eal, max_relative = 1e-12);

        let losses: BTreeMap<String, LossDistribution> =
            [(measure.name.clone(), measure_loss)].into_iter().collect();
        let costs: BTreeMap<String, f64> = [(measure.name.clone(), measure.cost)].into_iter().collect();
        let summary = evaluate_cost_benefit(
            &baseline,
            &losses,
            &costs,
            &DiscountSchedule::flat(2016, 2025, 0.02).unwrap(),
            &Horizon::new(2016, 2025).unwrap(),
        )
        .unwrap();

        assert_eq!(summary.ranking, vec!["Retrofitting"]);
        assert!(summary.results["Retrofitting"].benefit > 0.0);
    }
}
