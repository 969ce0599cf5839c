//! Loss distribution output structures

use serde::{Deserialize, Serialize};

use crate::hazard::HazardType;

/// Loss of one asset set under one event set and curve context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossDistribution {
    pub hazard_type: HazardType,

    /// Currency / value unit of the asset set
    pub value_unit: String,

    /// Event identifiers, parallel to `event_losses`
    pub event_ids: Vec<String>,

    /// Annual frequency of each event
    pub frequencies: Vec<f64>,

    /// Total loss over all assets, per event
    pub event_losses: Vec<f64>,

    /// Expected annual loss per asset, parallel to the asset set
    pub asset_eal: Vec<f64>,

    /// Expected annual loss of the whole asset set
    pub eal: f64,

    /// Event x asset loss matrix (rows = events), only kept on request
    pub loss_matrix: Option<Vec<Vec<f64>>>,
}

impl LossDistribution {
    /// EAL aggregated over events instead of assets
    pub fn event_weighted_eal(&self) -> f64 {
        self.event_losses
            .iter()
            .zip(&self.frequencies)
            .map(|(loss, freq)| loss * freq)
            .sum()
    }

    /// Absolute difference between the asset-wise and event-wise EAL
    pub fn aggregation_gap(&self) -> f64 {
        (self.eal - self.event_weighted_eal()).abs()
    }

    /// Largest single-event loss
    pub fn max_event_loss(&self) -> f64 {
        self.event_losses.iter().copied().fold(0.0, f64::max)
    }

    /// Loss at the requested return periods (years).
    ///
    /// Events are ranked by loss, largest first, and the cumulative frequency
    /// at each rank is the rate at which that loss is equalled or exceeded.
    /// Losses are interpolated linearly on frequency. Return periods rarer
    /// than the largest event report the largest event loss; return periods
    /// more frequent than every event (or non-positive) report zero.
    pub fn exceedance_curve(&self, return_periods: &[f64]) -> ExceedanceCurve {
        let mut ranked: Vec<(f64, f64)> = self
            .event_losses
            .iter()
            .copied()
            .zip(self.frequencies.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut cumulative = 0.0;
        let points: Vec<(f64, f64)> = ranked
            .into_iter()
            .map(|(loss, freq)| {
                cumulative += freq;
                (cumulative, loss)
            })
            .collect();

        let losses = return_periods
            .iter()
            .map(|&rp| loss_at_frequency(&points, rp))
            .collect();

        ExceedanceCurve {
            return_periods: return_periods.to_vec(),
            losses,
        }
    }
}

fn loss_at_frequency(points: &[(f64, f64)], return_period: f64) -> f64 {
    if !(return_period > 0.0) || points.is_empty() {
        return 0.0;
    }
    let freq = 1.0 / return_period;

    match points.iter().position(|&(cum, _)| cum >= freq) {
        None => 0.0,
        Some(0) => points[0].1,
        Some(i) => {
            let (f0, l0) = points[i - 1];
            let (f1, l1) = points[i];
            l0 + (l1 - l0) * (freq - f0) / (f1 - f0)
        }
    }
}

/// Loss by return period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceedanceCurve {
    pub return_periods: Vec<f64>,
    pub losses: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn distribution(event_losses: Vec<f64>, frequencies: Vec<f64>) -> LossDistribution {
        let eal = event_losses.iter().zip(&frequencies).map(|(l, f)| l * f).sum();
        LossDistribution {
            hazard_type: HazardType::tropical_cyclone(),
            value_unit: "USD".to_string(),
            event_ids: (0..event_losses.len()).map(|i| i.to_string()).collect(),
            frequencies,
            event_losses,
            asset_eal: vec![eal],
            eal,
            loss_matrix: None,
        }
    }

    #[test]
    fn test_exceedance_curve() {
        // Ranked losses 300, 200, 100 with cumulative freq 0.01, 0.06, 0.16
        let dist = distribution(vec![100.0, 300.0, 200.0], vec![0.1, 0.01, 0.05]);
        let curve = dist.exceedance_curve(&[1000.0, 100.0, 50.0, 1.0 / 0.06, 5.0, 0.0]);

        assert_relative_eq!(curve.losses[0], 300.0, epsilon = 1e-12); // rarer than any event
        assert_relative_eq!(curve.losses[1], 300.0, epsilon = 1e-12); // exactly the largest event
        // freq 0.02 between (0.01, 300) and (0.06, 200)
        assert_relative_eq!(curve.losses[2], 280.0, epsilon = 1e-9);
        assert_relative_eq!(curve.losses[3], 200.0, epsilon = 1e-9);
        assert_eq!(curve.losses[4], 0.0); // more frequent than all events
        assert_eq!(curve.losses[5], 0.0);
    }

    #[test]
    fn test_event_weighted_eal_and_max() {
        let dist = distribution(vec![100.0, 300.0], vec![0.1, 0.01]);
        assert_relative_eq!(dist.event_weighted_eal(), 13.0, epsilon = 1e-12);
        assert!(dist.aggregation_gap() < 1e-12);
        assert_eq!(dist.max_event_loss(), 300.0);
    }
}
