//! Seed Binary - Sample Data Importer and Synthetic Dataset Generator
//!
//! Loads the four-year bond return sample and, optionally, a synthetic
//! business dataset (revenue, sales, margin series with year-over-year
//! growth and noise) into the record store.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin seed
//! ```
//!
//! ## Environment Variables
//!
//! - BONDFLOW_DB_PATH - SQLite record store path (default: data/bondflow.db)
//! - SEED_BUSINESS_YEARS - Year span for the synthetic dataset, e.g. 2015-2025
//!   (default: 2015-2025; set empty to skip)
//! - RUST_LOG - Logging level (optional, default: info)

use bondflow::alert_core::{Observation, RecordStore};
use rand::Rng;
use std::env;

/// Annual bond returns used across the test suite and demos
const BOND_SAMPLE: &[(i32, f64, f64, f64)] = &[
    // (year, sp500_return, baa_bond_return, us_treasury_return)
    (2020, 0.18, 0.08, 0.04),
    (2021, 0.2889, 0.06, 0.03),
    (2022, -0.18, -0.08, 0.02),
    (2023, 0.26, 0.05, 0.04),
];

fn parse_year_span(s: &str) -> Option<(i32, i32)> {
    let (start, end) = s.split_once('-')?;
    let start = start.trim().parse().ok()?;
    let end = end.trim().parse().ok()?;
    if start <= end {
        Some((start, end))
    } else {
        None
    }
}

fn bond_sample() -> Vec<Observation> {
    let mut batch = Vec::new();
    for &(year, sp500, baa, treasury) in BOND_SAMPLE {
        batch.push(Observation::annual(year, "sp500_return", sp500).with_source("sample"));
        batch.push(Observation::annual(year, "baa_bond_return", baa).with_source("sample"));
        batch.push(
            Observation::annual(year, "us_treasury_return", treasury).with_source("sample"),
        );
    }
    batch
}

/// Revenue grows ~8%/year with seasonal noise; sales run at 60-90% of
/// revenue; margin is the sales/revenue ratio.
fn business_dataset(start_year: i32, end_year: i32) -> Vec<Observation> {
    let mut rng = rand::thread_rng();
    let base_revenue = 28_000_000.0_f64;
    let mut batch = Vec::new();

    for year in start_year..=end_year {
        let year_offset = (year - start_year) as f64;
        let growth_factor = 1.0 + year_offset * 0.08;
        let seasonal: f64 = rng.gen_range(0.8..1.2);
        let revenue = base_revenue * growth_factor * seasonal;

        let sales_ratio: f64 = rng.gen_range(0.6..0.9);
        let sales = revenue * sales_ratio;
        let margin = sales / revenue;

        batch.push(Observation::annual(year, "total_revenue", revenue).with_source("synthetic"));
        batch.push(Observation::annual(year, "total_sales", sales).with_source("synthetic"));
        batch.push(Observation::annual(year, "profit_margin", margin).with_source("synthetic"));
    }

    batch
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let db_path =
        env::var("BONDFLOW_DB_PATH").unwrap_or_else(|_| "data/bondflow.db".to_string());
    let business_span = env::var("SEED_BUSINESS_YEARS")
        .unwrap_or_else(|_| "2015-2025".to_string());

    log::info!("🚀 Seeding record store at {}", db_path);

    let mut store = RecordStore::open(&db_path)?;

    let bond = bond_sample();
    let written = store.insert_batch(&bond)?;
    log::info!(
        "✅ Bond sample: {} of {} observations written ({} already present)",
        written,
        bond.len(),
        bond.len() - written
    );

    if business_span.is_empty() {
        log::info!("⏭️  SEED_BUSINESS_YEARS empty, skipping synthetic dataset");
    } else {
        match parse_year_span(&business_span) {
            Some((start_year, end_year)) => {
                let business = business_dataset(start_year, end_year);
                let written = store.insert_batch(&business)?;
                log::info!(
                    "✅ Business dataset {}-{}: {} of {} observations written",
                    start_year,
                    end_year,
                    written,
                    business.len()
                );
            }
            None => {
                log::error!(
                    "Invalid SEED_BUSINESS_YEARS '{}', expected START-END",
                    business_span
                );
            }
        }
    }

    let metrics = store.metrics()?;
    log::info!("📊 Stored metrics: {:?}", metrics);

    Ok(())
}
