//! Cost-benefit evaluation of adaptation measures
//!
//! Avoided expected annual loss is discounted over the evaluation horizon
//! with a year-indexed rate schedule and compared against measure cost.

mod discount;
mod engine;

pub use discount::{DiscountSchedule, Horizon};
pub use engine::{BenefitCostRatio, CostBenefitEngine, CostBenefitResult, CostBenefitSummary};
