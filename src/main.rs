//! Cyclone Adapt CLI
//!
//! Runs a demonstration adaptation analysis for a coarse Florida asset grid
//! and prints the ranked cost-benefit results.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use cyclone_adapt::{
    tables, AdaptationAnalysis, AnalysisConfig, AnalysisReport, Asset, AssetSet, Event, EventSet,
    HazardType, Horizon, MeasureDefinition, VulnerabilityCurve, VulnerabilityCurveSet,
};

/// Total produced capital spread over the grid, USD
const TOTAL_VALUE_USD: f64 = 3.5e12;

#[derive(Parser, Debug)]
#[command(name = "cyclone_adapt", version, about = "Tropical-cyclone adaptation cost-benefit demo")]
struct Args {
    /// JSON analysis configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Flat annual discount rate
    #[arg(long)]
    discount_rate: Option<f64>,

    /// First year of the evaluation horizon
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year of the evaluation horizon
    #[arg(long)]
    end_year: Option<i32>,

    /// Directory for CSV output tables
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Evaluate measures one after another
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(rate) = args.discount_rate {
        config.discount_rate = rate;
    }
    config.horizon = Horizon::new(
        args.start_year.unwrap_or(config.horizon.start_year),
        args.end_year.unwrap_or(config.horizon.end_year),
    )?;
    config.parallel &= !args.sequential;

    println!("Cyclone Adapt v{}", env!("CARGO_PKG_VERSION"));
    println!("=====================\n");

    let tc = HazardType::tropical_cyclone();
    let assets = demo_assets(&tc)?;
    let events = demo_events(&tc, &assets)?.with_uniform_frequency(2000, 2020)?;
    let curves = VulnerabilityCurveSet::from_curves([VulnerabilityCurve::emanuel_usa(1)?]);

    let measures = vec![
        // Ecosystem buffer: 20% lower damage degree
        MeasureDefinition::scaled("Mangroves", 5e6, tc.clone(), 1, 2, 0.8)?,
        // Building retrofit: half the damage degree
        MeasureDefinition::scaled("Retrofitting", 1e8, tc.clone(), 1, 3, 0.5)?,
    ];

    println!("Assets: {} ({:.0} {})", assets.len(), assets.total_value(), assets.value_unit());
    println!("Events: {} (total frequency {:.3}/yr)", events.len(), events.total_frequency());
    println!(
        "Horizon: {}..={} at {:.2}%\n",
        config.horizon.start_year,
        config.horizon.end_year,
        config.discount_rate * 100.0
    );

    let analysis = AdaptationAnalysis::new(assets, events, curves, config);
    let report = analysis.run(&measures)?;

    print_report(&report);

    if let Some(dir) = &args.output_dir {
        write_tables(dir, &report)?;
        println!("\nTables written to: {}", dir.display());
    }

    Ok(())
}

/// 10 x 10 grid over the Florida bounding box with uneven, deterministic weights
fn demo_assets(tc: &HazardType) -> Result<AssetSet> {
    let (min_lon, min_lat, max_lon, max_lat) = (-87.63, 24.52, -80.03, 31.00);
    let n = 10;

    let mut cells = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let lat = min_lat + (max_lat - min_lat) * (i as f64 + 0.5) / n as f64;
            let lon = min_lon + (max_lon - min_lon) * (j as f64 + 0.5) / n as f64;
            let weight = 1.0 + ((i * 7 + j * 13) % 11) as f64;
            cells.push((lat, lon, weight));
        }
    }

    let total_weight: f64 = cells.iter().map(|(_, _, w)| w).sum();
    let assets = cells
        .into_iter()
        .map(|(lat, lon, w)| Asset::new(lat, lon, w / total_weight * TOTAL_VALUE_USD))
        .collect();

    Ok(AssetSet::new(assets, 2016, "USD")?.with_default_curve(tc, 1))
}

/// Illustrative storm footprints with exponential decay away from landfall.
/// Frequencies are left at zero for the uniform fallback.
fn demo_events(tc: &HazardType, assets: &AssetSet) -> Result<EventSet> {
    // (id, landfall lat, landfall lon, peak wind m/s, decay length deg)
    let storms = [
        ("andrew_1992", 25.5, -80.3, 72.0, 1.2),
        ("charley_2004", 26.7, -82.2, 65.0, 1.0),
        ("wilma_2005", 25.9, -81.7, 55.0, 1.8),
        ("irma_2017", 24.7, -81.5, 60.0, 2.2),
        ("michael_2018", 30.0, -85.5, 70.0, 1.0),
        ("ian_2022", 26.6, -82.2, 67.0, 1.6),
    ];

    let events = storms
        .iter()
        .map(|&(id, lat, lon, peak, decay)| {
            let intensity = assets
                .assets()
                .iter()
                .map(|a| {
                    let distance = ((a.latitude - lat).powi(2) + (a.longitude - lon).powi(2)).sqrt();
                    let wind = peak * (-distance / decay).exp();
                    if wind >= 15.0 {
                        wind
                    } else {
                        0.0
                    }
                })
                .collect();
            Event::new(id, intensity, 0.0)
        })
        .collect();

    Ok(EventSet::new(tc.clone(), events)?)
}

fn print_report(report: &AnalysisReport) {
    let baseline = &report.baseline;
    println!("Baseline expected annual loss: {:.0} {}", baseline.eal, baseline.value_unit);
    println!("Largest event loss:            {:.0}", baseline.max_event_loss());
    for (rp, loss) in report
        .baseline_exceedance
        .return_periods
        .iter()
        .zip(&report.baseline_exceedance.losses)
    {
        println!("  {:>5.0}-year loss: {:>18.0}", rp, loss);
    }

    let summary = &report.cost_benefit;
    println!("\nTotal climate risk: {:.0}", summary.total_climate_risk);
    println!(
        "\n{:>4} {:<14} {:>16} {:>16} {:>18} {:>10}",
        "Rank", "Measure", "Cost", "Benefit", "NetBenefit", "B/C"
    );
    println!("{}", "-".repeat(83));
    for (rank, result) in summary.ranked().enumerate() {
        let ratio = match result.ratio.value() {
            Some(v) => format!("{:.3}", v),
            None => "undefined".to_string(),
        };
        println!(
            "{:>4} {:<14} {:>16.0} {:>16.0} {:>18.0} {:>10}",
            rank + 1,
            result.name,
            result.cost,
            result.benefit,
            result.net_benefit,
            ratio
        );
    }
}

fn write_tables(dir: &Path, report: &AnalysisReport) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let create = |name: &str| -> Result<BufWriter<File>> {
        let path = dir.join(name);
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        Ok(BufWriter::new(file))
    };

    tables::write_event_losses(create("event_losses.csv")?, &report.baseline)?;
    tables::write_asset_eal(create("asset_eal.csv")?, &report.baseline)?;
    tables::write_exceedance(create("exceedance.csv")?, &report.baseline_exceedance)?;
    tables::write_cost_benefit(create("cost_benefit.csv")?, &report.cost_benefit)?;
    if report.baseline.loss_matrix.is_some() {
        tables::write_loss_matrix(create("loss_matrix.csv")?, &report.baseline)?;
    }
    Ok(())
}
