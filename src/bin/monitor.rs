//! Monitor Binary - Periodic Threshold Evaluation Loop
//!
//! Evaluates the configured thresholds against the record store on a fixed
//! interval and appends fresh violations to the alert sink.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin monitor [-- --backend sqlite|jsonl]
//! ```
//!
//! ## Environment Variables
//!
//! - BONDFLOW_DB_PATH - SQLite record store path (default: data/bondflow.db)
//! - ALERT_METRICS - Comma-separated metric names (default: sp500_return,baa_bond_return)
//! - ALERT_THRESHOLD - Numeric boundary (default: 0.10)
//! - ALERT_DIRECTION - above|below (default: below)
//! - ALERT_DEDUP_WINDOW_SECS - Re-alert suppression window (default: 3600)
//! - CHECK_INTERVAL_SECS - Seconds between evaluation cycles (default: 60)
//! - SUMMARY_WINDOW_DAYS - Recency window for summary counts (default: 7)
//! - ALERTS_JSONL_PATH - JSONL output path when --backend jsonl (default: data/alerts.jsonl)
//! - RUST_LOG - Logging level (optional, default: info)

use bondflow::alert_core::{AlertSink, MonitorEngine, RecordStore};
use bondflow::config::{BackendType, MonitorConfig};
use std::path::PathBuf;
use tokio::time::{interval, Duration};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = MonitorConfig::from_env();
    config.validate()?;
    let backend = MonitorConfig::parse_backend_from_args();

    log::info!("🚀 Starting Bondflow Monitor");
    log::info!("   Database: {}", config.db_path);
    log::info!("   Metrics: {:?}", config.metrics);
    log::info!(
        "   Threshold: {} ({})",
        config.threshold,
        config.direction.as_str()
    );
    log::info!("   Dedup window: {}s", config.dedup_window_secs);
    log::info!("   Check interval: {}s", config.check_interval_secs);

    let store = RecordStore::open(&config.db_path)?;

    match store.latest_alert()? {
        Some(last) => log::info!(
            "📜 Last recorded alert: {} {} at {}",
            last.period,
            last.metric,
            last.evaluated_at
        ),
        None => log::info!("📜 No alert history yet"),
    }

    let sink_path = match backend {
        BackendType::Sqlite => PathBuf::from(&config.db_path),
        BackendType::Jsonl => PathBuf::from(&config.alerts_jsonl_path),
    };
    let sink = AlertSink::new(backend, sink_path)?;
    log::info!("📊 Alert sink backend: {}", sink.backend_type());

    let mut engine = MonitorEngine::new(
        store,
        sink,
        config.thresholds(),
        config.report_config(),
        config.dedup_window_secs,
        config.summary_window_days,
    );

    let mut check_ticker = interval(Duration::from_secs(config.check_interval_secs));

    log::info!("✅ Monitor running - evaluating thresholds...");

    loop {
        check_ticker.tick().await;

        let range = match engine.store().period_bounds() {
            Ok(Some(range)) => range,
            Ok(None) => {
                log::info!("⏳ No observations stored yet, skipping cycle");
                continue;
            }
            Err(e) => {
                log::error!("Failed to read period bounds: {}", e);
                continue;
            }
        };

        match engine.check_alerts(&range).await {
            Ok(events) if events.is_empty() => {
                log::info!("✅ No new alerts over {}", range);
            }
            Ok(events) => {
                log::info!("🔴 Recorded {} new alerts:", events.len());
                for event in &events {
                    log::info!(
                        "   - {} {}: {:.4} {} threshold {:.4}",
                        event.period,
                        event.metric,
                        event.observed,
                        event.direction.as_str(),
                        event.threshold
                    );
                }

                match engine.alert_summary() {
                    Ok(summary) => log::info!(
                        "📊 Alert summary: {} total, {} in last {} days ({:.2}/day)",
                        summary.total_alerts,
                        summary.recent_alerts,
                        summary.window_days,
                        summary.alert_rate
                    ),
                    Err(e) => log::error!("Failed to compute alert summary: {}", e),
                }
            }
            Err(e) => {
                log::error!("Alert check failed: {}", e);
            }
        }
    }
}
