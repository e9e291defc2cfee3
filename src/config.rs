//! Monitor configuration from environment variables

use crate::alert_core::evaluator::AlertThreshold;
use crate::alert_core::record::Direction;
use crate::alert_core::report::ReportConfig;
use std::env;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendType {
    Jsonl,
    Sqlite,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for the monitor runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Path to the SQLite record store
    pub db_path: String,

    /// Metric names to evaluate each cycle
    pub metrics: Vec<String>,

    /// Numeric boundary applied to every monitored metric
    pub threshold: f64,

    /// Side of the boundary that counts as a violation
    pub direction: Direction,

    /// Suppress re-alerts for the same (metric, period) within this window
    pub dedup_window_secs: i64,

    /// Seconds between evaluation cycles
    pub check_interval_secs: u64,

    /// Recency window for alert summary counts
    pub summary_window_days: i64,

    /// JSONL output path (used when --backend jsonl)
    pub alerts_jsonl_path: String,

    /// Metric names behind the dashboard report kinds
    pub revenue_metric: String,
    pub sales_metric: String,
    pub margin_metric: String,
}

impl MonitorConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `BONDFLOW_DB_PATH` (default: data/bondflow.db)
    /// - `ALERT_METRICS` (comma-separated, default: sp500_return,baa_bond_return)
    /// - `ALERT_THRESHOLD` (default: 0.10)
    /// - `ALERT_DIRECTION` (above|below, default: below)
    /// - `ALERT_DEDUP_WINDOW_SECS` (default: 3600)
    /// - `CHECK_INTERVAL_SECS` (default: 60)
    /// - `SUMMARY_WINDOW_DAYS` (default: 7)
    /// - `ALERTS_JSONL_PATH` (default: data/alerts.jsonl)
    /// - `REVENUE_METRIC` / `SALES_METRIC` / `MARGIN_METRIC`
    ///   (defaults: total_revenue / total_sales / profit_margin)
    pub fn from_env() -> Self {
        let direction_str =
            env::var("ALERT_DIRECTION").unwrap_or_else(|_| "below".to_string());
        let direction = match Direction::from_str(&direction_str.to_lowercase()) {
            Some(direction) => direction,
            None => {
                log::warn!(
                    "Invalid ALERT_DIRECTION '{}', defaulting to below",
                    direction_str
                );
                Direction::Below
            }
        };

        Self {
            db_path: env::var("BONDFLOW_DB_PATH")
                .unwrap_or_else(|_| "data/bondflow.db".to_string()),

            metrics: env::var("ALERT_METRICS")
                .unwrap_or_else(|_| "sp500_return,baa_bond_return".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            threshold: env::var("ALERT_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.10),

            direction,

            dedup_window_secs: env::var("ALERT_DEDUP_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3_600),

            check_interval_secs: env::var("CHECK_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),

            summary_window_days: env::var("SUMMARY_WINDOW_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),

            alerts_jsonl_path: env::var("ALERTS_JSONL_PATH")
                .unwrap_or_else(|_| "data/alerts.jsonl".to_string()),

            revenue_metric: env::var("REVENUE_METRIC")
                .unwrap_or_else(|_| "total_revenue".to_string()),
            sales_metric: env::var("SALES_METRIC")
                .unwrap_or_else(|_| "total_sales".to_string()),
            margin_metric: env::var("MARGIN_METRIC")
                .unwrap_or_else(|_| "profit_margin".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ALERT_METRICS cannot be empty".to_string(),
            ));
        }

        if !self.threshold.is_finite() {
            return Err(ConfigError::InvalidValue(
                "ALERT_THRESHOLD must be a finite number".to_string(),
            ));
        }

        if self.check_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "CHECK_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        if self.dedup_window_secs < 0 {
            return Err(ConfigError::InvalidValue(
                "ALERT_DEDUP_WINDOW_SECS cannot be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// One threshold per monitored metric, all sharing the configured
    /// boundary and direction
    pub fn thresholds(&self) -> Vec<AlertThreshold> {
        self.metrics
            .iter()
            .map(|metric| AlertThreshold::new(metric.clone(), self.threshold, self.direction))
            .collect()
    }

    pub fn report_config(&self) -> ReportConfig {
        ReportConfig {
            revenue_metric: self.revenue_metric.clone(),
            sales_metric: self.sales_metric.clone(),
            margin_metric: self.margin_metric.clone(),
        }
    }

    /// `--backend sqlite|jsonl` from the command line (default: sqlite)
    pub fn parse_backend_from_args() -> BackendType {
        let args: Vec<String> = env::args().collect();

        if let Some(idx) = args.iter().position(|x| x == "--backend") {
            match args.get(idx + 1).map(|s| s.as_str()) {
                Some("sqlite") => return BackendType::Sqlite,
                Some("jsonl") => return BackendType::Jsonl,
                _ => {}
            }
        }

        BackendType::Sqlite
    }
}
