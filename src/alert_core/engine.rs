//! Monitor engine - orchestration facade over store, evaluator, analyzer,
//! and formatter
//!
//! This is the surface the excluded routing/presentation layer calls:
//!
//! ```text
//! RecordStore (observations + alert history)
//!     ↓ read
//! AlertEvaluator (per configured threshold)  →  AlertSink (append-only)
//! CorrelationAnalyzer (pairwise Pearson)
//! ReportFormatter (revenue / sales / margin / trend)
//! ```
//!
//! The engine holds no derived state between calls; every operation is a
//! read-then-compute cycle against the store.

use super::correlator::{CorrelationAnalyzer, CorrelationResult};
use super::error::AnalyticsError;
use super::evaluator::{AlertEvaluator, AlertThreshold};
use super::period::PeriodRange;
use super::record::{AlertEvent, Observation};
use super::report::{ReportConfig, ReportFormatter, ReportTable};
use super::sink::AlertSink;
use super::store::{AlertSummary, RecordStore};
use serde::Serialize;
use std::path::Path;

/// Records-plus-alerts dump written by `export_json`
#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    records: &'a [Observation],
    alerts: &'a [AlertEvent],
    export_time: String,
}

pub struct MonitorEngine {
    store: RecordStore,
    evaluators: Vec<AlertEvaluator>,
    analyzer: CorrelationAnalyzer,
    formatter: ReportFormatter,
    sink: AlertSink,
    dedup_window_secs: i64,
    summary_window_days: i64,
    /// Timestamp function (for testing with mock time)
    now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
}

impl MonitorEngine {
    pub fn new(
        store: RecordStore,
        sink: AlertSink,
        thresholds: Vec<AlertThreshold>,
        report_config: ReportConfig,
        dedup_window_secs: i64,
        summary_window_days: i64,
    ) -> Self {
        Self::new_with_timestamp_fn(
            store,
            sink,
            thresholds,
            report_config,
            dedup_window_secs,
            summary_window_days,
            Box::new(|| chrono::Utc::now().timestamp()),
        )
    }

    /// Create an engine with a custom timestamp function (deterministic tests)
    pub fn new_with_timestamp_fn(
        store: RecordStore,
        sink: AlertSink,
        thresholds: Vec<AlertThreshold>,
        report_config: ReportConfig,
        dedup_window_secs: i64,
        summary_window_days: i64,
        now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
    ) -> Self {
        Self {
            store,
            evaluators: thresholds.into_iter().map(AlertEvaluator::new).collect(),
            analyzer: CorrelationAnalyzer::new(),
            formatter: ReportFormatter::new(report_config),
            sink,
            dedup_window_secs,
            summary_window_days,
            now_fn,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Evaluate every configured threshold over the range and append the
    /// fresh violations through the sink.
    ///
    /// Returns the newly recorded events only; violations already alerted
    /// within the dedup window are filtered out. This append is the only
    /// mutation in the system.
    pub async fn check_alerts(
        &mut self,
        range: &PeriodRange,
    ) -> Result<Vec<AlertEvent>, AnalyticsError> {
        let now = (self.now_fn)();
        let mut recorded = Vec::new();

        for evaluator in &self.evaluators {
            let events =
                evaluator.evaluate_new(&self.store, range, now, self.dedup_window_secs)?;
            for event in events {
                self.sink.write_alert(&event).await?;
                recorded.push(event);
            }
        }

        if !recorded.is_empty() {
            self.sink.flush().await?;
        }

        Ok(recorded)
    }

    pub fn correlate(
        &self,
        metric_a: &str,
        metric_b: &str,
        range: &PeriodRange,
    ) -> Result<CorrelationResult, AnalyticsError> {
        self.analyzer.correlate(&self.store, metric_a, metric_b, range)
    }

    /// Pairwise correlation across every stored metric
    pub fn correlation_matrix(
        &self,
        range: &PeriodRange,
    ) -> Result<Vec<CorrelationResult>, AnalyticsError> {
        let metrics = self.store.metrics()?;
        self.analyzer.matrix(&self.store, &metrics, range)
    }

    pub fn alert_summary(&self) -> Result<AlertSummary, AnalyticsError> {
        let now = (self.now_fn)();
        Ok(self.store.alert_summary(now, self.summary_window_days)?)
    }

    /// Range query passthrough with the metric existence check applied
    pub fn historical(
        &self,
        metric: &str,
        range: &PeriodRange,
    ) -> Result<Vec<Observation>, AnalyticsError> {
        if range.is_empty() {
            return Err(AnalyticsError::InvalidRange(format!(
                "empty range {}",
                range
            )));
        }
        if !self.store.has_metric(metric)? {
            return Err(AnalyticsError::NotFound(format!("metric '{}'", metric)));
        }
        Ok(self.store.query(metric, range)?)
    }

    pub fn format_report(
        &self,
        report_type: &str,
        range: &PeriodRange,
    ) -> Result<ReportTable, AnalyticsError> {
        self.formatter.format_named(&self.store, report_type, range)
    }

    /// Dump all records and alert history as one JSON document
    pub fn export_json(&self, output: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let records = self.store.all_observations()?;
        let alerts = self.store.all_alerts()?;

        let document = ExportDocument {
            records: &records,
            alerts: &alerts,
            export_time: chrono::Utc::now().to_rfc3339(),
        };

        let json = serde_json::to_string_pretty(&document)
            .map_err(super::sink_backend::SinkError::Serialization)?;
        std::fs::write(output.as_ref(), json)
            .map_err(super::sink_backend::SinkError::Io)?;

        log::info!(
            "✅ Exported {} records and {} alerts to {}",
            records.len(),
            alerts.len(),
            output.as_ref().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert_core::period::Period;
    use crate::alert_core::record::Direction;
    use crate::config::BackendType;
    use tempfile::tempdir;

    fn sample_engine(dir: &tempfile::TempDir, now: i64) -> MonitorEngine {
        let db_path = dir.path().join("test.db");
        let mut store = RecordStore::open(&db_path).unwrap();
        store
            .insert_batch(&[
                Observation::annual(2020, "sp500_return", 0.18),
                Observation::annual(2021, "sp500_return", 0.2889),
                Observation::annual(2022, "sp500_return", -0.18),
                Observation::annual(2023, "sp500_return", 0.26),
                Observation::annual(2020, "baa_bond_return", 0.08),
                Observation::annual(2021, "baa_bond_return", 0.06),
                Observation::annual(2022, "baa_bond_return", -0.08),
                Observation::annual(2023, "baa_bond_return", 0.05),
            ])
            .unwrap();

        let sink = AlertSink::new(BackendType::Sqlite, db_path).unwrap();
        MonitorEngine::new_with_timestamp_fn(
            store,
            sink,
            vec![
                AlertThreshold::new("sp500_return", 0.10, Direction::Below),
                AlertThreshold::new("baa_bond_return", 0.10, Direction::Below),
            ],
            ReportConfig::default(),
            3600,
            7,
            Box::new(move || now),
        )
    }

    #[tokio::test]
    async fn test_check_alerts_records_and_dedups() {
        let dir = tempdir().unwrap();
        let mut engine = sample_engine(&dir, 1_700_000_000);
        let range = PeriodRange::years(2020, 2023);

        let first = engine.check_alerts(&range).await.unwrap();
        // sp500 below 0.10 in 2022; baa below 0.10 in all four years
        assert_eq!(first.len(), 5);
        assert!(first
            .iter()
            .any(|e| e.metric == "sp500_return" && e.period == Period::annual(2022)));

        // Second cycle inside the dedup window records nothing
        let second = engine.check_alerts(&range).await.unwrap();
        assert!(second.is_empty());

        let summary = engine.alert_summary().unwrap();
        assert_eq!(summary.total_alerts, 5);
        assert_eq!(summary.recent_alerts, 5);
    }

    #[tokio::test]
    async fn test_correlation_matrix_across_stored_metrics() {
        let dir = tempdir().unwrap();
        let engine = sample_engine(&dir, 1_700_000_000);

        let results = engine
            .correlation_matrix(&PeriodRange::years(2020, 2023))
            .unwrap();
        // Two stored metrics -> one pair
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].samples, 4);
        assert!(results[0].coefficient.abs() <= 1.0);
    }

    #[tokio::test]
    async fn test_historical_passthrough_and_errors() {
        let dir = tempdir().unwrap();
        let engine = sample_engine(&dir, 1_700_000_000);

        let series = engine
            .historical("sp500_return", &PeriodRange::years(2021, 2022))
            .unwrap();
        assert_eq!(series.len(), 2);

        let err = engine
            .historical("nope", &PeriodRange::years(2021, 2022))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_export_json_document() {
        let dir = tempdir().unwrap();
        let mut engine = sample_engine(&dir, 1_700_000_000);
        engine
            .check_alerts(&PeriodRange::years(2020, 2023))
            .await
            .unwrap();

        let out = dir.path().join("export.json");
        engine.export_json(&out).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(parsed["records"].as_array().unwrap().len(), 8);
        assert_eq!(parsed["alerts"].as_array().unwrap().len(), 5);
        assert!(parsed["export_time"].is_string());
    }
}
