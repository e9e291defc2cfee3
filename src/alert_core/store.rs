//! SQLite-backed record store for metric observations and alert history
//!
//! Owns the two persisted tables: `observations` (one row per period+metric,
//! immutable once written) and `alerts` (append-only violation log). The
//! evaluator and analyzer only read; alert persistence is the single write
//! path back into this store.

use super::period::{Period, PeriodRange};
use super::record::{AlertEvent, Direction, Observation};
use crate::sqlite_pragma::apply_optimized_pragmas;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Io(std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Summary statistics for one metric over a period range
#[derive(Debug, Clone, Serialize)]
pub struct MetricAggregate {
    pub count: i64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sum: f64,
}

/// Alert history counts over a recency window
#[derive(Debug, Clone, Serialize)]
pub struct AlertSummary {
    pub total_alerts: i64,
    pub recent_alerts: i64,
    pub window_days: i64,
    /// Recent alerts per day
    pub alert_rate: f64,
}

/// SQLite record store
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (creating if needed) the store at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;

        // Apply optimized PRAGMAs (WAL, NORMAL, MEMORY, mmap, cache, autocheckpoint)
        apply_optimized_pragmas(&conn)?;

        // month column: 0 = annual observation, 1-12 = monthly
        conn.execute(
            "CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL DEFAULT 0,
                metric TEXT NOT NULL,
                value REAL NOT NULL,
                source TEXT,
                recorded_at INTEGER NOT NULL,
                UNIQUE(year, month, metric)
            )",
            [],
        )?;

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
        )?;

        // Indexes for the range queries and dedup lookups
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_obs_metric_period
             ON observations(metric, year, month)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_alerts_evaluated
             ON alerts(evaluated_at DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_alerts_metric_period
             ON alerts(metric, year, month)",
            [],
        )?;

        log::info!("✅ Record store initialized with WAL mode");

        Ok(Self { conn })
    }

    /// Insert one observation.
    ///
    /// Returns false when the (period, metric) slot is already written;
    /// existing observations are never overwritten.
    pub fn insert(&self, obs: &Observation) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO observations
             (year, month, metric, value, source, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                obs.period.year,
                obs.period.month_key(),
                obs.metric,
                obs.value,
                obs.source,
                obs.recorded_at,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Insert a batch inside one transaction; returns the number actually written
    pub fn insert_batch(&mut self, batch: &[Observation]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut written = 0;

        for obs in batch {
            let changed = tx.execute(
                "INSERT OR IGNORE INTO observations
                 (year, month, metric, value, source, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    obs.period.year,
                    obs.period.month_key(),
                    obs.metric,
                    obs.value,
                    obs.source,
                    obs.recorded_at,
                ],
            )?;
            written += changed;
        }

        tx.commit()?;

        log::debug!("✅ Inserted {} of {} observations", written, batch.len());
        Ok(written)
    }

    /// Query one metric's series over an inclusive range, period ascending
    pub fn query(
        &self,
        metric: &str,
        range: &PeriodRange,
    ) -> Result<Vec<Observation>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT year, month, metric, value, source, recorded_at
             FROM observations
             WHERE metric = ?1
               AND (year > ?2 OR (year = ?2 AND month >= ?3))
               AND (year < ?4 OR (year = ?4 AND month <= ?5))
             ORDER BY year ASC, month ASC",
        )?;

        let rows = stmt.query_map(
            params![
                metric,
                range.start.year,
                range.start.month_key(),
                range.end.year,
                range.end.month_key(),
            ],
            |row| {
                Ok(Observation {
                    period: Period::from_parts(row.get(0)?, row.get(1)?),
                    metric: row.get(2)?,
                    value: row.get(3)?,
                    source: row.get(4)?,
                    recorded_at: row.get(5)?,
                })
            },
        )?;

        let mut observations = Vec::new();
        for row in rows {
            observations.push(row?);
        }
        Ok(observations)
    }

    /// Whether any observation carries this metric name
    pub fn has_metric(&self, metric: &str) -> Result<bool, StoreError> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM observations WHERE metric = ?1)",
            params![metric],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// Distinct metric names, sorted
    pub fn metrics(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT metric FROM observations ORDER BY metric ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(row?);
        }
        Ok(metrics)
    }

    /// Year span covering every stored observation, None when empty.
    ///
    /// The range runs from the earliest year's annual bucket through December
    /// of the latest year, so it covers monthly observations too.
    pub fn period_bounds(&self) -> Result<Option<PeriodRange>, StoreError> {
        let bounds: (Option<i32>, Option<i32>) = self.conn.query_row(
            "SELECT MIN(year), MAX(year) FROM observations",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(match bounds {
            (Some(min_year), Some(max_year)) => Some(PeriodRange {
                start: Period::annual(min_year),
                end: Period {
                    year: max_year,
                    month: Some(12),
                },
            }),
            _ => None,
        })
    }

    /// Aggregate statistics for one metric over a range, None when no rows match
    pub fn aggregate(
        &self,
        metric: &str,
        range: &PeriodRange,
    ) -> Result<Option<MetricAggregate>, StoreError> {
        let agg = self.conn.query_row(
            "SELECT COUNT(*), MIN(value), MAX(value), AVG(value), SUM(value)
             FROM observations
             WHERE metric = ?1
               AND (year > ?2 OR (year = ?2 AND month >= ?3))
               AND (year < ?4 OR (year = ?4 AND month <= ?5))",
            params![
                metric,
                range.start.year,
                range.start.month_key(),
                range.end.year,
                range.end.month_key(),
            ],
            |row| {
                let count: i64 = row.get(0)?;
                if count == 0 {
                    return Ok(None);
                }
                Ok(Some(MetricAggregate {
                    count,
                    min: row.get(1)?,
                    max: row.get(2)?,
                    mean: row.get(3)?,
                    sum: row.get(4)?,
                }))
            },
        )?;
        Ok(agg)
    }

    /// Append one alert event to the history log
    pub fn append_alert(&self, event: &AlertEvent) -> Result<(), StoreError> {
        self.conn.execute(
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
        )?;
        Ok(())
    }

    /// Whether an alert for (metric, period) was recorded after `since`
    pub fn recent_alert_exists(
        &self,
        metric: &str,
        period: &Period,
        since: i64,
    ) -> Result<bool, StoreError> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM alerts
                 WHERE metric = ?1 AND year = ?2 AND month = ?3 AND evaluated_at > ?4
             )",
            params![metric, period.year, period.month_key(), since],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// Alert history counts; `now` is passed in so callers control the clock
    pub fn alert_summary(
        &self,
        now: i64,
        window_days: i64,
    ) -> Result<AlertSummary, StoreError> {
        let total_alerts: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))?;

        let since = now - window_days * 86_400;
        let recent_alerts: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM alerts WHERE evaluated_at > ?1",
            params![since],
            |row| row.get(0),
        )?;

        let alert_rate = if window_days > 0 {
            recent_alerts as f64 / window_days as f64
        } else {
            0.0
        };

        Ok(AlertSummary {
            total_alerts,
            recent_alerts,
            window_days,
            alert_rate,
        })
    }

    /// Full alert history, oldest first (export path)
    pub fn all_alerts(&self) -> Result<Vec<AlertEvent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT year, month, metric, observed, threshold, direction, evaluated_at
             FROM alerts
             ORDER BY evaluated_at ASC, id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let direction_str: String = row.get(5)?;
            let direction = Direction::from_str(&direction_str)
                .ok_or(rusqlite::Error::InvalidQuery)?;
            Ok(AlertEvent {
                period: Period::from_parts(row.get(0)?, row.get(1)?),
                metric: row.get(2)?,
                observed: row.get(3)?,
                threshold: row.get(4)?,
                direction,
                evaluated_at: row.get(6)?,
            })
        })?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row?);
        }
        Ok(alerts)
    }

    /// Full observation dump, period ascending per metric (export path)
    pub fn all_observations(&self) -> Result<Vec<Observation>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT year, month, metric, value, source, recorded_at
             FROM observations
             ORDER BY metric ASC, year ASC, month ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Observation {
                period: Period::from_parts(row.get(0)?, row.get(1)?),
                metric: row.get(2)?,
                value: row.get(3)?,
                source: row.get(4)?,
                recorded_at: row.get(5)?,
            })
        })?;

        let mut observations = Vec::new();
        for row in rows {
            observations.push(row?);
        }
        Ok(observations)
    }

    /// Latest recorded alert, if any
    pub fn latest_alert(&self) -> Result<Option<AlertEvent>, StoreError> {
        let event = self
            .conn
            .query_row(
                "SELECT year, month, metric, observed, threshold, direction, evaluated_at
                 FROM alerts
                 ORDER BY evaluated_at DESC, id DESC
                 LIMIT 1",
                [],
                |row| {
                    let direction_str: String = row.get(5)?;
                    let direction = Direction::from_str(&direction_str)
                        .ok_or(rusqlite::Error::InvalidQuery)?;
                    Ok(AlertEvent {
                        period: Period::from_parts(row.get(0)?, row.get(1)?),
                        metric: row.get(2)?,
                        observed: row.get(3)?,
                        threshold: row.get(4)?,
                        direction,
                        evaluated_at: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_test_store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_and_query_ordering() {
        let (_dir, mut store) = open_test_store();

        store
            .insert_batch(&[
                Observation::annual(2023, "sp500_return", 0.2629),
                Observation::annual(2021, "sp500_return", 0.2889),
                Observation::annual(2022, "sp500_return", -0.1804),
            ])
            .unwrap();

        let series = store
            .query("sp500_return", &PeriodRange::years(2021, 2023))
            .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].period, Period::annual(2021));
        assert_eq!(series[1].period, Period::annual(2022));
        assert_eq!(series[2].period, Period::annual(2023));
    }

    #[test]
    fn test_duplicate_period_ignored() {
        let (_dir, store) = open_test_store();

        let first = Observation::annual(2021, "sp500_return", 0.2889);
        let correction = Observation::annual(2021, "sp500_return", 0.99);

        assert!(store.insert(&first).unwrap());
        assert!(!store.insert(&correction).unwrap());

        let series = store
            .query("sp500_return", &PeriodRange::years(2021, 2021))
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 0.2889);
    }

    #[test]
    fn test_range_filters_monthly_boundaries() {
        let (_dir, mut store) = open_test_store();

        store
            .insert_batch(&[
                Observation::new(Period::monthly(2023, 1).unwrap(), "bond_yield", 4.1),
                Observation::new(Period::monthly(2023, 6).unwrap(), "bond_yield", 4.4),
                Observation::new(Period::monthly(2023, 12).unwrap(), "bond_yield", 4.9),
            ])
            .unwrap();

        let range = PeriodRange::new(
            Period::monthly(2023, 2).unwrap(),
            Period::monthly(2023, 11).unwrap(),
        );
        let series = store.query("bond_yield", &range).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].period, Period::monthly(2023, 6).unwrap());
    }

    #[test]
    fn test_has_metric_and_listing() {
        let (_dir, store) = open_test_store();

        store
            .insert(&Observation::annual(2020, "us_treasury_return", 0.04))
            .unwrap();

        assert!(store.has_metric("us_treasury_return").unwrap());
        assert!(!store.has_metric("unknown_metric").unwrap());
        assert_eq!(store.metrics().unwrap(), vec!["us_treasury_return"]);
    }

    #[test]
    fn test_aggregate() {
        let (_dir, mut store) = open_test_store();

        store
            .insert_batch(&[
                Observation::annual(2020, "total_revenue", 100.0),
                Observation::annual(2021, "total_revenue", 200.0),
                Observation::annual(2022, "total_revenue", 300.0),
            ])
            .unwrap();

        let agg = store
            .aggregate("total_revenue", &PeriodRange::years(2020, 2022))
            .unwrap()
            .unwrap();
        assert_eq!(agg.count, 3);
        assert_eq!(agg.min, 100.0);
        assert_eq!(agg.max, 300.0);
        assert_eq!(agg.mean, 200.0);
        assert_eq!(agg.sum, 600.0);

        let empty = store
            .aggregate("total_revenue", &PeriodRange::years(1990, 1999))
            .unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn test_alert_append_dedup_and_summary() {
        let (_dir, store) = open_test_store();

        let event = AlertEvent {
            period: Period::annual(2022),
            metric: "sp500_return".to_string(),
            observed: -0.1804,
            threshold: 0.10,
            direction: Direction::Below,
            evaluated_at: 1_700_000_000,
        };

        store.append_alert(&event).unwrap();

        assert!(store
            .recent_alert_exists("sp500_return", &Period::annual(2022), 1_699_999_000)
            .unwrap());
        assert!(!store
            .recent_alert_exists("sp500_return", &Period::annual(2022), 1_700_000_001)
            .unwrap());
        assert!(!store
            .recent_alert_exists("baa_bond_return", &Period::annual(2022), 0)
            .unwrap());

        let summary = store.alert_summary(1_700_000_100, 7).unwrap();
        assert_eq!(summary.total_alerts, 1);
        assert_eq!(summary.recent_alerts, 1);
        assert!((summary.alert_rate - 1.0 / 7.0).abs() < 1e-12);

        let latest = store.latest_alert().unwrap().unwrap();
        assert_eq!(latest.metric, "sp500_return");

        let history = store.all_alerts().unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_period_bounds() {
        let (_dir, mut store) = open_test_store();

        assert!(store.period_bounds().unwrap().is_none());

        store
            .insert_batch(&[
                Observation::annual(2015, "total_revenue", 1.0),
                Observation::annual(2025, "total_sales", 2.0),
            ])
            .unwrap();

        let bounds = store.period_bounds().unwrap().unwrap();
        assert_eq!(bounds.start, Period::annual(2015));
        assert!(bounds.contains(&Period::monthly(2025, 12).unwrap()));
    }
}
