//! SQLite sink for alert events - batched appends into the store's alerts table
//!
//! Owns its own connection to the store database; WAL mode lets it write
//! while the monitor's reader connection stays open.

use super::record::AlertEvent;
use super::sink_backend::{AlertSinkBackend, SinkError};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Instant;

pub struct SqliteAlertSink {
    conn: Connection,
    batch: Vec<AlertEvent>,
    batch_size: usize,
    last_flush: Instant,
    flush_interval_secs: u64,
}

impl SqliteAlertSink {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, SinkError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn =
            Connection::open(db_path).map_err(|e| SinkError::Database(e.to_string()))?;

        apply_optimized_pragmas(&conn).map_err(|e| SinkError::Database(e.to_string()))?;

        // Same DDL as the record store; idempotent when the store opened first
        conn.execute(
            "CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL DEFAULT 0,
                metric TEXT NOT NULL,
                observed REAL NOT NULL,
                threshold REAL NOT NULL,
                direction TEXT NOT NULL,
                evaluated_at INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| SinkError::Database(e.to_string()))?;

        log::info!("✅ SQLite alert sink initialized");

        Ok(Self {
            conn,
            batch: Vec::with_capacity(100),
            batch_size: 100,
            last_flush: Instant::now(),
            flush_interval_secs: 2,
        })
    }

    fn flush_batch(&mut self) -> Result<(), SinkError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|e| SinkError::Database(e.to_string()))?;

        for event in &self.batch {
            tx.execute(
                "INSERT INTO alerts
                 (year, month, metric, observed, threshold, direction, evaluated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.period.year,
                    event.period.month_key(),
                    event.metric,
                    event.observed,
                    event.threshold,
                    event.direction.as_str(),
                    event.evaluated_at,
                ],
            )
            .map_err(|e| SinkError::Database(e.to_string()))?;
        }

        tx.commit().map_err(|e| SinkError::Database(e.to_string()))?;

        log::debug!("✅ Flushed {} alert events to SQLite", self.batch.len());
        self.batch.clear();
        self.last_flush = Instant::now();

        Ok(())
    }
}

#[async_trait]
impl AlertSinkBackend for SqliteAlertSink {
    async fn write_alert(&mut self, event: &AlertEvent) -> Result<(), SinkError> {
        self.batch.push(event.clone());

        // Auto-flush if batch full or time elapsed
        if self.batch.len() >= self.batch_size
            || self.last_flush.elapsed().as_secs() >= self.flush_interval_secs
        {
            self.flush_batch()?;
        }

        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.flush_batch()
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert_core::period::Period;
    use crate::alert_core::record::Direction;
    use crate::alert_core::store::RecordStore;
    use tempfile::tempdir;

    fn create_test_event(year: i32) -> AlertEvent {
        AlertEvent {
            period: Period::annual(year),
            metric: "baa_bond_return".to_string(),
            observed: -0.08,
            threshold: 0.10,
            direction: Direction::Below,
            evaluated_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_sink_appends_visible_to_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        // Store opens first and owns the schema
        let store = RecordStore::open(&db_path).unwrap();

        let mut sink = SqliteAlertSink::new(&db_path).unwrap();
        sink.write_alert(&create_test_event(2022)).await.unwrap();
        sink.flush().await.unwrap();

        let alerts = store.all_alerts().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, "baa_bond_return");
        assert_eq!(alerts[0].period, Period::annual(2022));
    }

    #[tokio::test]
    async fn test_batch_flush_threshold() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let mut sink = SqliteAlertSink::new(&db_path).unwrap();

        // 150 events should trigger one auto-flush at 100
        for i in 0..150 {
            sink.write_alert(&create_test_event(1900 + i)).await.unwrap();
        }
        sink.flush().await.unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 150);
    }
}
