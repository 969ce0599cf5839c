//! Adaptation analysis runner
//!
//! Holds the resident asset set, event set and baseline curves, computes the
//! baseline loss once, then evaluates every measure independently against the
//! unmodified baseline (in parallel when configured).
//!
//! # Example
//! ```ignore
//! let analysis = AdaptationAnalysis::new(assets, events, curves, AnalysisConfig::default());
//! let report = analysis.run(&measures)?;
//! for result in report.cost_benefit.ranked() {
//!     println!("{}: {:?}", result.name, result.ratio);
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cost_benefit::{CostBenefitEngine, CostBenefitSummary, DiscountSchedule, Horizon};
use crate::error::{Result, RiskError};
use crate::exposure::AssetSet;
use crate::hazard::EventSet;
use crate::impact::{ExceedanceCurve, ImpactConfig, ImpactEngine, LossDistribution};
use crate::measures::{MeasureDefinition, MeasureEngine};
use crate::vulnerability::VulnerabilityCurveSet;

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Years over which avoided losses accrue
    pub horizon: Horizon,

    /// Flat annual rate used when no explicit schedule is supplied
    pub discount_rate: f64,

    /// Keep event x asset loss matrices in the report
    pub keep_loss_matrix: bool,

    /// Evaluate measures on the rayon thread pool
    pub parallel: bool,

    /// Return periods (years) reported on the baseline exceedance curve
    pub return_periods: Vec<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            // 2% over 50 years from the 2016 exposure reference year
            horizon: Horizon {
                start_year: 2016,
                end_year: 2065,
            },
            discount_rate: 0.02,
            keep_loss_matrix: false,
            parallel: true,
            return_periods: vec![10.0, 25.0, 50.0, 100.0, 250.0],
        }
    }
}

impl AnalysisConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.horizon.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Flat schedule at `discount_rate` covering exactly the horizon
    pub fn discount_schedule(&self) -> Result<DiscountSchedule> {
        DiscountSchedule::flat(
            self.horizon.start_year,
            self.horizon.end_year,
            self.discount_rate,
        )
    }
}

/// Output of a full analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub baseline: LossDistribution,

    /// Loss distribution under each measure, by measure name
    pub measures: BTreeMap<String, LossDistribution>,

    pub cost_benefit: CostBenefitSummary,

    /// Baseline losses at the configured return periods
    pub baseline_exceedance: ExceedanceCurve,
}

/// Pre-loaded inputs for repeated measure evaluations
#[derive(Debug, Clone)]
pub struct AdaptationAnalysis {
    assets: AssetSet,
    events: EventSet,
    curves: VulnerabilityCurveSet,
    config: AnalysisConfig,
}

impl AdaptationAnalysis {
    pub fn new(
        assets: AssetSet,
        events: EventSet,
        curves: VulnerabilityCurveSet,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            assets,
            events,
            curves,
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetSet {
        &self.assets
    }

    pub fn events(&self) -> &EventSet {
        &self.events
    }

    pub fn curves(&self) -> &VulnerabilityCurveSet {
        &self.curves
    }

    fn impact_engine(&self) -> ImpactEngine {
        ImpactEngine::new(ImpactConfig {
            keep_matrix: self.config.keep_loss_matrix,
        })
    }

    /// Baseline loss distribution
    pub fn baseline(&self) -> Result<LossDistribution> {
        self.impact_engine()
            .compute(&self.assets, &self.events, &self.curves, &[])
    }

    /// Loss distribution with a single measure in place
    pub fn measure_loss(&self, measure: &MeasureDefinition) -> Result<LossDistribution> {
        let applied = MeasureEngine::apply(measure, &self.curves)?;
        self.impact_engine().compute(
            &self.assets,
            &self.events,
            &applied.curves,
            std::slice::from_ref(&applied.curve_override),
        )
    }

    /// Run with a flat schedule built from the configured discount rate
    pub fn run(&self, measures: &[MeasureDefinition]) -> Result<AnalysisReport> {
        let schedule = self.config.discount_schedule()?;
        self.run_with_schedule(measures, &schedule)
    }

    /// Evaluate every measure against the baseline and rank them
    pub fn run_with_schedule(
        &self,
        measures: &[MeasureDefinition],
        schedule: &DiscountSchedule,
    ) -> Result<AnalysisReport> {
        let mut costs = BTreeMap::new();
        for measure in measures {
            if costs.insert(measure.name.clone(), measure.cost).is_some() {
                return Err(RiskError::InvalidMeasure {
                    name: measure.name.clone(),
                    reason: "duplicate measure name".to_string(),
                });
            }
        }
        // Fail on an uncovered horizon before any impact work
        schedule.check_covers(&self.config.horizon)?;

        log::info!(
            "running adaptation analysis: {} assets, {} events, {} measure(s)",
            self.assets.len(),
            self.events.len(),
            measures.len()
        );

        let baseline = self.baseline()?;

        let evaluate = |measure: &MeasureDefinition| -> Result<(String, LossDistribution)> {
            let loss = self.measure_loss(measure)?;
            log::debug!("measure '{}' EAL {:.2}", measure.name, loss.eal);
            Ok((measure.name.clone(), loss))
        };
        let measure_losses: BTreeMap<String, LossDistribution> = if self.config.parallel {
            measures.par_iter().map(evaluate).collect::<Result<_>>()?
        } else {
            measures.iter().map(evaluate).collect::<Result<_>>()?
        };

        let cost_benefit = CostBenefitEngine::evaluate(
            &baseline,
            &measure_losses,
            &costs,
            schedule,
            &self.config.horizon,
        )?;
        let baseline_exceedance = baseline.exceedance_curve(&self.config.return_periods);

        Ok(AnalysisReport {
            baseline,
            measures: measure_losses,
            cost_benefit,
            baseline_exceedance,
        })
    }
}
