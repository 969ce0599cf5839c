//! Impact engine
//!
//! For every event and asset the applicable curve is resolved (native
//! assignment, optionally remapped by measure overrides), the damage ratio is
//! read at the event intensity and multiplied by the asset value. Losses are
//! aggregated two ways:
//! - per event: sum over assets
//! - per asset: frequency-weighted sum over events (expected annual loss)
//!
//! Both routes must give the same total EAL.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::exposure::AssetSet;
use crate::hazard::EventSet;
use crate::measures::CurveOverride;
use crate::vulnerability::{VulnerabilityCurve, VulnerabilityCurveSet};

use super::LossDistribution;

/// Relative tolerance for the asset-wise vs event-wise EAL check
const AGGREGATION_TOLERANCE: f64 = 1e-9;

/// Impact computation options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// Keep the full event x asset loss matrix in the output
    pub keep_matrix: bool,
}

/// Computes loss distributions
#[derive(Debug, Clone, Default)]
pub struct ImpactEngine {
    config: ImpactConfig,
}

impl ImpactEngine {
    pub fn new(config: ImpactConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImpactConfig {
        &self.config
    }

    /// Compute the loss distribution of `assets` under `events`.
    ///
    /// `overrides` remap curve ids for the matching hazard type; pass an empty
    /// slice for the baseline. Every asset's curve is resolved up front, so a
    /// missing curve fails with `CurveNotFound` even if the asset is never hit.
    pub fn compute(
        &self,
        assets: &AssetSet,
        events: &EventSet,
        curves: &VulnerabilityCurveSet,
        overrides: &[CurveOverride],
    ) -> Result<LossDistribution> {
        events.check_shape(assets.len())?;
        let hazard_type = events.hazard_type();

        let asset_curves = resolve_curves(assets, events, curves, overrides)?;

        log::debug!(
            "computing {} impact: {} events x {} assets, {} override(s)",
            hazard_type,
            events.len(),
            assets.len(),
            overrides.len()
        );

        let mut event_losses = Vec::with_capacity(events.len());
        let mut asset_eal = vec![0.0; assets.len()];
        let mut loss_matrix = self
            .config
            .keep_matrix
            .then(|| Vec::with_capacity(events.len()));

        for event in events.events() {
            let mut row = loss_matrix.as_ref().map(|_| vec![0.0; assets.len()]);
            let mut total = 0.0;

            for (index, (asset, curve)) in assets.assets().iter().zip(&asset_curves).enumerate() {
                let Some(intensity) = event.intensity_at(index) else {
                    continue;
                };
                let loss = curve.damage_ratio(intensity) * asset.value;
                total += loss;
                asset_eal[index] += loss * event.frequency;
                if let Some(row) = row.as_mut() {
                    row[index] = loss;
                }
            }

            event_losses.push(total);
            if let (Some(matrix), Some(row)) = (loss_matrix.as_mut(), row) {
                matrix.push(row);
            }
        }

        let eal: f64 = asset_eal.iter().sum();
        let distribution = LossDistribution {
            hazard_type: hazard_type.clone(),
            value_unit: assets.value_unit().to_string(),
            event_ids: events.events().iter().map(|e| e.id.clone()).collect(),
            frequencies: events.events().iter().map(|e| e.frequency).collect(),
            event_losses,
            asset_eal,
            eal,
            loss_matrix,
        };

        let gap = distribution.aggregation_gap();
        if gap > AGGREGATION_TOLERANCE * eal.abs().max(1.0) {
            log::warn!(
                "asset-wise EAL {} and event-wise EAL {} differ by {}",
                eal,
                distribution.event_weighted_eal(),
                gap
            );
        }

        log::debug!("{} EAL: {:.2} {}", hazard_type, eal, distribution.value_unit);
        Ok(distribution)
    }
}

/// Resolve the curve every asset uses under this event set's hazard type
fn resolve_curves<'a>(
    assets: &AssetSet,
    events: &EventSet,
    curves: &'a VulnerabilityCurveSet,
    overrides: &[CurveOverride],
) -> Result<Vec<&'a VulnerabilityCurve>> {
    let hazard_type = events.hazard_type();

    assets
        .assets()
        .iter()
        .enumerate()
        .map(|(index, asset)| {
            let native = asset
                .curve_id(hazard_type)
                .ok_or_else(|| RiskError::InvalidAsset {
                    index,
                    reason: format!("no curve assigned for hazard {}", hazard_type),
                })?;
            let id = overrides
                .iter()
                .find_map(|o| o.remap(hazard_type, native))
                .unwrap_or(native);
            curves.lookup(hazard_type, id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::Asset;
    use crate::hazard::{Event, HazardType};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn threshold_curve(id: u32) -> VulnerabilityCurve {
        VulnerabilityCurve::new(
            HazardType::tropical_cyclone(),
            id,
            "threshold",
            vec![0.0, 20.0, 40.0, 60.0],
            vec![0.0, 0.2, 0.5, 1.0],
            vec![0.0, 0.1, 0.4, 0.8],
        )
        .unwrap()
    }

    fn single_asset(curve_id: u32) -> AssetSet {
        let tc = HazardType::tropical_cyclone();
        AssetSet::new(
            vec![Asset::new(25.8, -80.2, 1_000_000.0).with_curve(tc, curve_id)],
            2016,
            "USD",
        )
        .unwrap()
    }

    fn mixed_inputs() -> (AssetSet, EventSet, VulnerabilityCurveSet) {
        let tc = HazardType::tropical_cyclone();
        let assets = AssetSet::new(
            vec![
                Asset::new(25.8, -80.2, 1_000_000.0).with_curve(tc.clone(), 1),
                Asset::new(26.1, -80.1, 250_000.0).with_curve(tc.clone(), 2),
                Asset::new(27.9, -82.5, 3_500_000.0).with_curve(tc.clone(), 1),
                Asset::new(30.4, -87.2, 0.0).with_curve(tc.clone(), 2),
            ],
            2016,
            "USD",
        )
        .unwrap();
        let events = EventSet::new(
            tc,
            vec![
                Event::new("andrew", vec![62.0, 55.0, 18.0, 0.0], 0.02),
                Event::new("irma", vec![35.0, 41.5, 47.0, 12.0], 0.05),
                Event::new("michael", vec![0.0, f64::NAN, 22.0, 67.0], 0.033),
                Event::new("minor", vec![5.0, 5.0, 5.0, 5.0], 0.7),
            ],
        )
        .unwrap();
        let curves = VulnerabilityCurveSet::from_curves([
            threshold_curve(1),
            VulnerabilityCurve::emanuel_usa(2).unwrap(),
        ]);
        (assets, events, curves)
    }

    #[test]
    fn test_single_event_at_threshold() {
        let tc = HazardType::tropical_cyclone();
        let curve = VulnerabilityCurve::new(
            tc.clone(),
            1,
            "flat",
            vec![10.0, 50.0],
            vec![0.5, 0.5],
            vec![0.4, 0.4],
        )
        .unwrap();
        let events = EventSet::new(tc, vec![Event::new("e1", vec![50.0], 0.1)]).unwrap();

        let dist = ImpactEngine::default()
            .compute(&single_asset(1), &events, &VulnerabilityCurveSet::from_curves([curve]), &[])
            .unwrap();

        assert_relative_eq!(dist.event_losses[0], 200_000.0, epsilon = 1e-6);
        assert_relative_eq!(dist.eal, 20_000.0, epsilon = 1e-6);
        assert_relative_eq!(dist.asset_eal[0], 20_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dual_aggregation_agrees() {
        let (assets, events, curves) = mixed_inputs();
        let dist = ImpactEngine::default()
            .compute(&assets, &events, &curves, &[])
            .unwrap();

        let asset_sum: f64 = dist.asset_eal.iter().sum();
        assert_abs_diff_eq!(dist.eal, asset_sum, epsilon = 1e-9);
        assert_abs_diff_eq!(dist.eal, dist.event_weighted_eal(), epsilon = 1e-9);
        assert!(dist.eal > 0.0);
        // Zero-valued asset never contributes
        assert_eq!(dist.asset_eal[3], 0.0);
    }

    #[test]
    fn test_unexposed_assets_have_no_loss() {
        let (assets, events, curves) = mixed_inputs();
        let dist = ImpactEngine::new(ImpactConfig { keep_matrix: true })
            .compute(&assets, &events, &curves, &[])
            .unwrap();

        let matrix = dist.loss_matrix.as_ref().unwrap();
        assert_eq!(matrix.len(), 4);
        assert_eq!(matrix[0][3], 0.0);
        assert_eq!(matrix[2][0], 0.0);
        assert_eq!(matrix[2][1], 0.0);
        for (row, total) in matrix.iter().zip(&dist.event_losses) {
            assert_abs_diff_eq!(row.iter().sum::<f64>(), *total, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_frequency_gives_zero_eal() {
        let (assets, events, curves) = mixed_inputs();
        let silent: Vec<Event> = events
            .events()
            .iter()
            .map(|e| Event::new(e.id.clone(), e.intensity.clone(), 0.0))
            .collect();
        let silent = EventSet::new(events.hazard_type().clone(), silent).unwrap();

        let dist = ImpactEngine::default()
            .compute(&assets, &silent, &curves, &[])
            .unwrap();

        assert_eq!(dist.eal, 0.0);
        assert!(dist.asset_eal.iter().all(|&v| v == 0.0));
        assert!(dist.max_event_loss() > 0.0);
    }

    #[test]
    fn test_missing_curve_fails() {
        let (assets, events, _) = mixed_inputs();
        let only_first = VulnerabilityCurveSet::from_curves([threshold_curve(1)]);

        let result = ImpactEngine::default().compute(&assets, &events, &only_first, &[]);
        assert!(matches!(result, Err(RiskError::CurveNotFound { id: 2, .. })));
    }

    #[test]
    fn test_missing_curve_fails_without_events() {
        let tc = HazardType::tropical_cyclone();
        let events = EventSet::new(tc, Vec::new()).unwrap();
        let result = ImpactEngine::default().compute(
            &single_asset(9),
            &events,
            &VulnerabilityCurveSet::from_curves([threshold_curve(1)]),
            &[],
        );
        assert!(matches!(result, Err(RiskError::CurveNotFound { id: 9, .. })));
    }

    #[test]
    fn test_override_remaps_curve() {
        let (assets, events, curves) = mixed_inputs();
        let tc = HazardType::tropical_cyclone();
        let curves = curves.with_curve(threshold_curve(1).scale(0.0).unwrap().relabel(5, "immune"));

        let remap = CurveOverride::new(tc, 1, 5);
        let dist = ImpactEngine::default()
            .compute(&assets, &events, &curves, &[remap])
            .unwrap();

        assert_eq!(dist.asset_eal[0], 0.0);
        assert_eq!(dist.asset_eal[2], 0.0);
        assert!(dist.asset_eal[1] > 0.0);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let tc = HazardType::tropical_cyclone();
        let events = EventSet::new(tc, vec![Event::new("e", vec![30.0, 30.0], 0.1)]).unwrap();
        let result = ImpactEngine::default().compute(
            &single_asset(1),
            &events,
            &VulnerabilityCurveSet::from_curves([threshold_curve(1)]),
            &[],
        );
        assert!(matches!(result, Err(RiskError::InvalidEvent { .. })));
    }
}
