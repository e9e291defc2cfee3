//! Integration tests for the full monitor flow: seed observations, evaluate
//! thresholds, persist alerts, then read back reports, correlations, and
//! summary counts through the engine surface.

#[cfg(test)]
mod monitor_flow_tests {
    use bondflow::alert_core::{
        AlertSink, AlertThreshold, Direction, MonitorEngine, Observation, Period, PeriodRange,
        RecordStore, ReportConfig,
    };
    use bondflow::config::BackendType;

    fn seed_store(db_path: &std::path::Path) -> RecordStore {
        let mut store = RecordStore::open(db_path).unwrap();
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
                Observation::annual(2022, "total_revenue", 100.0),
                Observation::annual(2023, "total_revenue", 120.0),
            ])
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_check_persist_and_summarize_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("bondflow.db");

        let store = seed_store(&db_path);
        let sink = AlertSink::new(BackendType::Sqlite, db_path.clone()).unwrap();

        let mut engine = MonitorEngine::new_with_timestamp_fn(
            store,
            sink,
            vec![AlertThreshold::new("sp500_return", 0.10, Direction::Below)],
            ReportConfig::default(),
            3600,
            7,
            Box::new(|| 1_700_000_000),
        );

        let range = engine.store().period_bounds().unwrap().unwrap();
        assert!(range.contains(&Period::annual(2021)));

        // First cycle: only 2022 (-0.18) falls below 0.10
        let events = engine.check_alerts(&range).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].period, Period::annual(2022));
        assert_eq!(events[0].observed, -0.18);

        // The append is visible through a fresh store connection
        let verify = RecordStore::open(&db_path).unwrap();
        let persisted = verify.all_alerts().unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].metric, "sp500_return");

        // Second cycle inside the dedup window is quiet
        let repeat = engine.check_alerts(&range).await.unwrap();
        assert!(repeat.is_empty());

        let summary = engine.alert_summary().unwrap();
        assert_eq!(summary.total_alerts, 1);
        assert_eq!(summary.recent_alerts, 1);
    }

    #[tokio::test]
    async fn test_jsonl_backend_keeps_store_clean() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("bondflow.db");
        let jsonl_path = dir.path().join("alerts.jsonl");

        let store = seed_store(&db_path);
        let sink = AlertSink::new(BackendType::Jsonl, jsonl_path.clone()).unwrap();

        let mut engine = MonitorEngine::new_with_timestamp_fn(
            store,
            sink,
            vec![AlertThreshold::new("sp500_return", 0.20, Direction::Above)],
            ReportConfig::default(),
            3600,
            7,
            Box::new(|| 1_700_000_000),
        );

        let range = PeriodRange::years(2020, 2023);
        let events = engine.check_alerts(&range).await.unwrap();
        // 2021 (0.2889) and 2023 (0.26) exceed 0.20
        assert_eq!(events.len(), 2);

        let content = std::fs::read_to_string(&jsonl_path).unwrap();
        assert_eq!(content.lines().count(), 2);

        // JSONL emission leaves the store's alert history untouched
        assert_eq!(engine.store().all_alerts().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_reports_and_correlations_over_seeded_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("bondflow.db");

        let store = seed_store(&db_path);
        let sink = AlertSink::new(BackendType::Sqlite, db_path.clone()).unwrap();

        let engine = MonitorEngine::new(
            store,
            sink,
            vec![],
            ReportConfig::default(),
            3600,
            7,
        );

        let table = engine
            .format_report("revenue", &PeriodRange::years(2022, 2023))
            .unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows[0].growth_pct.is_none());
        assert!((table.rows[1].growth_pct.unwrap() - 20.0).abs() < 1e-12);

        let correlation = engine
            .correlate(
                "sp500_return",
                "baa_bond_return",
                &PeriodRange::years(2020, 2023),
            )
            .unwrap();
        assert_eq!(correlation.samples, 4);
        assert!(correlation.coefficient > 0.0);
        assert!(correlation.coefficient <= 1.0);

        // Matrix spans all three stored metrics: 3 unordered pairs. The
        // revenue series only overlaps the bond series on 2022-2023, so
        // those pairs run on exactly 2 aligned points.
        let matrix = engine
            .correlation_matrix(&PeriodRange::years(2020, 2023))
            .unwrap();
        assert_eq!(matrix.len(), 3);
        let revenue_pair = matrix
            .iter()
            .find(|r| r.metric_b == "total_revenue" && r.metric_a == "sp500_return")
            .unwrap();
        assert_eq!(revenue_pair.samples, 2);
    }
}
