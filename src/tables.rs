//! Flat CSV tables for loss and cost-benefit outputs
//!
//! Every writer takes any `std::io::Write`, so callers choose files, buffers
//! or network streams.

use std::io::Write;

use serde::Serialize;

use crate::cost_benefit::CostBenefitSummary;
use crate::error::Result;
use crate::impact::{ExceedanceCurve, LossDistribution};

#[derive(Debug, Serialize)]
struct EventLossRow<'a> {
    #[serde(rename = "EventID")]
    event_id: &'a str,
    #[serde(rename = "Frequency")]
    frequency: f64,
    #[serde(rename = "Loss")]
    loss: f64,
}

#[derive(Debug, Serialize)]
struct AssetEalRow {
    #[serde(rename = "AssetIndex")]
    asset_index: usize,
    #[serde(rename = "EAL")]
    eal: f64,
}

#[derive(Debug, Serialize)]
struct ExceedanceRow {
    #[serde(rename = "ReturnPeriod")]
    return_period: f64,
    #[serde(rename = "Loss")]
    loss: f64,
}

#[derive(Debug, Serialize)]
struct CostBenefitRow<'a> {
    #[serde(rename = "Rank")]
    rank: usize,
    #[serde(rename = "Measure")]
    measure: &'a str,
    #[serde(rename = "Cost")]
    cost: f64,
    #[serde(rename = "BaselineEAL")]
    baseline_eal: f64,
    #[serde(rename = "MeasureEAL")]
    measure_eal: f64,
    #[serde(rename = "AvoidedAnnualLoss")]
    avoided_annual_loss: f64,
    #[serde(rename = "Benefit")]
    benefit: f64,
    #[serde(rename = "NetBenefit")]
    net_benefit: f64,
    #[serde(rename = "BenefitCostRatio")]
    ratio: f64,
    #[serde(rename = "ZeroCost")]
    zero_cost: bool,
    #[serde(rename = "ResidualRisk")]
    residual_risk: f64,
}

/// One row per event: id, frequency, total loss
pub fn write_event_losses<W: Write>(writer: W, loss: &LossDistribution) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for ((event_id, &frequency), &event_loss) in loss
        .event_ids
        .iter()
        .zip(&loss.frequencies)
        .zip(&loss.event_losses)
    {
        csv_writer.serialize(EventLossRow {
            event_id,
            frequency,
            loss: event_loss,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// One row per asset: index in the asset set, expected annual loss
pub fn write_asset_eal<W: Write>(writer: W, loss: &LossDistribution) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (asset_index, &eal) in loss.asset_eal.iter().enumerate() {
        csv_writer.serialize(AssetEalRow { asset_index, eal })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Event x asset loss matrix with a header of asset indices.
/// Writes nothing but the header when the matrix was not kept.
pub fn write_loss_matrix<W: Write>(writer: W, loss: &LossDistribution) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["EventID".to_string()];
    header.extend((0..loss.asset_eal.len()).map(|i| i.to_string()));
    csv_writer.write_record(&header)?;

    if let Some(matrix) = &loss.loss_matrix {
        for (event_id, row) in loss.event_ids.iter().zip(matrix) {
            let mut record = vec![event_id.clone()];
            record.extend(row.iter().map(|v| v.to_string()));
            csv_writer.write_record(&record)?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_exceedance<W: Write>(writer: W, curve: &ExceedanceCurve) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (&return_period, &loss) in curve.return_periods.iter().zip(&curve.losses) {
        csv_writer.serialize(ExceedanceRow {
            return_period,
            loss,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// One row per measure in ranking order.
/// Zero-cost ratios are written as +/-inf with `ZeroCost` set.
pub fn write_cost_benefit<W: Write>(writer: W, summary: &CostBenefitSummary) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (rank, result) in summary.ranked().enumerate() {
        csv_writer.serialize(CostBenefitRow {
            rank: rank + 1,
            measure: &result.name,
            cost: result.cost,
            baseline_eal: result.baseline_eal,
            measure_eal: result.measure_eal,
            avoided_annual_loss: result.avoided_annual_loss,
            benefit: result.benefit,
            net_benefit: result.net_benefit,
            ratio: result.ratio.as_f64(),
            zero_cost: result.ratio.is_undefined(),
            residual_risk: result.residual_risk,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
