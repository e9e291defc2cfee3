//! Report Binary - One-Shot Dashboard Data Dump
//!
//! Prints a report table and, optionally, aggregate statistics, the
//! correlation matrix, and the alert summary as JSON on stdout. This is the
//! data feed the excluded dashboard layer would serve over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin report -- [revenue|sales|margin|trend] \
//!     [--from 2020] [--to 2023] [--correlate] [--summary]
//! ```
//!
//! ## Environment Variables
//!
//! - BONDFLOW_DB_PATH - SQLite record store path (default: data/bondflow.db)
//! - REVENUE_METRIC / SALES_METRIC / MARGIN_METRIC - series behind the
//!   report kinds
//! - RUST_LOG - Logging level (optional, default: warn)

use bondflow::alert_core::{CorrelationAnalyzer, Period, RecordStore, ReportFormatter};
use bondflow::config::MonitorConfig;
use serde_json::json;
use std::env;

/// `--from 2020` / `--to 2023-06` style period flag
fn parse_period_arg(args: &[String], flag: &str) -> Option<Period> {
    let idx = args.iter().position(|a| a == flag)?;
    let value = args.get(idx + 1)?;
    match Period::from_str(value) {
        Some(period) => Some(period),
        None => {
            eprintln!("ignoring malformed {} value '{}'", flag, value);
            None
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = MonitorConfig::from_env();
    let args: Vec<String> = env::args().collect();

    let report_type = args
        .get(1)
        .filter(|a| !a.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("revenue");
    let want_correlation = args.iter().any(|a| a == "--correlate");
    let want_summary = args.iter().any(|a| a == "--summary");

    let store = RecordStore::open(&config.db_path)?;

    let mut range = match store.period_bounds()? {
        Some(range) => range,
        None => {
            eprintln!("record store at {} is empty; run seed first", config.db_path);
            std::process::exit(1);
        }
    };
    if let Some(from) = parse_period_arg(&args, "--from") {
        range.start = from;
    }
    if let Some(to) = parse_period_arg(&args, "--to") {
        range.end = to;
    }

    let formatter = ReportFormatter::new(config.report_config());
    let table = formatter.format_named(&store, report_type, &range)?;

    let aggregate = store.aggregate(&table.metric, &range)?;

    let mut output = json!({
        "report": table,
        "range": range,
        "aggregate": aggregate,
    });

    if want_correlation {
        let metrics = store.metrics()?;
        let matrix = CorrelationAnalyzer::new().matrix(&store, &metrics, &range)?;
        output["correlations"] = serde_json::to_value(&matrix)?;
    }

    if want_summary {
        let now = chrono::Utc::now().timestamp();
        let summary = store.alert_summary(now, config.summary_window_days)?;
        output["alert_summary"] = serde_json::to_value(&summary)?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
