//! Cost-benefit engine
//!
//! Per measure:
//! 1. avoided annual loss = baseline EAL - measure EAL (negative when the
//!    measure increases expected loss; reported, not rejected)
//! 2. benefit = avoided annual loss discounted over every horizon year
//! 3. net benefit = benefit - cost, ratio = benefit / cost
//!
//! Zero-cost measures get an undefined ratio rather than an error.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::impact::LossDistribution;

use super::{DiscountSchedule, Horizon};

/// Benefit/cost ratio with a sentinel for zero-cost measures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BenefitCostRatio {
    Finite(f64),

    /// Cost is zero. Ranks above every finite ratio when the benefit is
    /// positive and below every finite ratio otherwise.
    Undefined { benefit_positive: bool },
}

impl BenefitCostRatio {
    fn from_parts(benefit: f64, cost: f64) -> Self {
        if cost > 0.0 {
            BenefitCostRatio::Finite(benefit / cost)
        } else {
            BenefitCostRatio::Undefined {
                benefit_positive: benefit > 0.0,
            }
        }
    }

    /// Numeric ratio, `None` for zero-cost measures
    pub fn value(&self) -> Option<f64> {
        match self {
            BenefitCostRatio::Finite(v) => Some(*v),
            BenefitCostRatio::Undefined { .. } => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, BenefitCostRatio::Undefined { .. })
    }

    /// Flat numeric form: +/- infinity for undefined ratios
    pub fn as_f64(&self) -> f64 {
        match self {
            BenefitCostRatio::Finite(v) => *v,
            BenefitCostRatio::Undefined {
                benefit_positive: true,
            } => f64::INFINITY,
            BenefitCostRatio::Undefined {
                benefit_positive: false,
            } => f64::NEG_INFINITY,
        }
    }
}

/// Decision metrics for one measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBenefitResult {
    pub name: String,
    pub cost: f64,
    pub baseline_eal: f64,
    pub measure_eal: f64,
    pub avoided_annual_loss: f64,

    /// Discounted avoided loss over the horizon
    pub benefit: f64,

    pub net_benefit: f64,
    pub ratio: BenefitCostRatio,

    /// Discounted expected loss remaining with the measure in place
    pub residual_risk: f64,
}

/// All measures of one evaluation, plus their deterministic ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBenefitSummary {
    pub horizon: Horizon,

    /// Discounted baseline expected loss over the horizon
    pub total_climate_risk: f64,

    pub results: BTreeMap<String, CostBenefitResult>,

    /// Measure names by ratio desc, net benefit desc, name asc
    pub ranking: Vec<String>,
}

impl CostBenefitSummary {
    /// Results in ranking order
    pub fn ranked(&self) -> impl Iterator<Item = &CostBenefitResult> {
        self.ranking.iter().filter_map(|name| self.results.get(name))
    }

    pub fn best(&self) -> Option<&CostBenefitResult> {
        self.ranked().next()
    }
}

/// Ranking order: ratio desc, then net benefit desc, then name asc
pub(crate) fn rank_order(a: &CostBenefitResult, b: &CostBenefitResult) -> Ordering {
    b.ratio
        .as_f64()
        .total_cmp(&a.ratio.as_f64())
        .then_with(|| b.net_benefit.total_cmp(&a.net_benefit))
        .then_with(|| a.name.cmp(&b.name))
}

/// Stateless cost-benefit evaluation
pub struct CostBenefitEngine;

impl CostBenefitEngine {
    /// Evaluate every measure in `measure_losses` against `baseline`.
    ///
    /// Each measure needs an entry in `measure_costs`; costs without a loss
    /// entry are ignored. Fails with `DiscountScheduleGap` if the horizon is
    /// not fully covered by `schedule`.
    pub fn evaluate(
        baseline: &LossDistribution,
        measure_losses: &BTreeMap<String, LossDistribution>,
        measure_costs: &BTreeMap<String, f64>,
        schedule: &DiscountSchedule,
        horizon: &Horizon,
    ) -> Result<CostBenefitSummary> {
        // Present value of one unit per horizon year
        let annuity = schedule.pv_level_stream(1.0, horizon)?;

        let mut results = BTreeMap::new();
        for (name, loss) in measure_losses {
            let cost = *measure_costs
                .get(name)
                .ok_or_else(|| RiskError::MissingMeasureCost(name.clone()))?;
            check_comparable(name, baseline, loss)?;
            if !cost.is_finite() || cost < 0.0 {
                return Err(RiskError::InvalidMeasure {
                    name: name.clone(),
                    reason: format!("cost {} must be finite and non-negative", cost),
                });
            }

            let result = Self::measure_result(name, cost, baseline.eal, loss.eal, annuity);
            if result.ratio.is_undefined() {
                log::warn!("measure '{}' has zero cost; ratio reported as undefined", name);
            }
            if result.avoided_annual_loss < 0.0 {
                log::warn!(
                    "measure '{}' increases expected annual loss by {:.2}",
                    name,
                    -result.avoided_annual_loss
                );
            }
            results.insert(name.clone(), result);
        }

        let mut ordered: Vec<&CostBenefitResult> = results.values().collect();
        ordered.sort_by(|a, b| rank_order(a, b));
        let ranking = ordered.into_iter().map(|r| r.name.clone()).collect();

        let summary = CostBenefitSummary {
            horizon: *horizon,
            total_climate_risk: baseline.eal * annuity,
            results,
            ranking,
        };

        log::info!(
            "evaluated {} measure(s) over {}..={}, total climate risk {:.2}",
            summary.results.len(),
            horizon.start_year,
            horizon.end_year,
            summary.total_climate_risk
        );
        Ok(summary)
    }

    fn measure_result(
        name: &str,
        cost: f64,
        baseline_eal: f64,
        measure_eal: f64,
        annuity: f64,
    ) -> CostBenefitResult {
        let avoided_annual_loss = baseline_eal - measure_eal;
        let benefit = avoided_annual_loss * annuity;

        CostBenefitResult {
            name: name.to_string(),
            cost,
            baseline_eal,
            measure_eal,
            avoided_annual_loss,
            benefit,
            net_benefit: benefit - cost,
            ratio: BenefitCostRatio::from_parts(benefit, cost),
            residual_risk: measure_eal * annuity,
        }
    }
}

/// Measure losses must come from the same hazard and event set as the baseline
fn check_comparable(name: &str, baseline: &LossDistribution, loss: &LossDistribution) -> Result<()> {
    if loss.hazard_type != baseline.hazard_type || loss.event_ids != baseline.event_ids {
        return Err(RiskError::InvalidMeasure {
            name: name.to_string(),
            reason: "loss distribution was computed on a different event set".to_string(),
        });
    }
    Ok(())
}
