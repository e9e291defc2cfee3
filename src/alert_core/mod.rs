//! Alert Core - Threshold Evaluation and Correlation Analytics
//!
//! This module provides the monitoring core: a metric record store plus the
//! stateless evaluation, correlation, and report-shaping components on top
//! of it.
//!
//! # Architecture
//!
//! ```text
//! SQLite Database → RecordStore (observations + alert history)
//!     ↓
//! AlertEvaluator (threshold + direction per metric)
//!     ↓
//! AlertSink → JSONL or SQLite backend (append-only)
//!
//! RecordStore → CorrelationAnalyzer (period-aligned Pearson)
//! RecordStore → ReportFormatter (revenue / sales / margin / trend)
//! ```
//!
//! Every operation is a single read-then-compute cycle; no component keeps
//! state between invocations.

pub mod correlator;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod jsonl_sink;
pub mod period;
pub mod record;
pub mod report;
pub mod sink;
pub mod sink_backend;
pub mod sqlite_sink;
pub mod store;

pub use correlator::{CorrelationAnalyzer, CorrelationResult};
pub use engine::MonitorEngine;
pub use error::AnalyticsError;
pub use evaluator::{AlertEvaluator, AlertThreshold};
pub use jsonl_sink::JsonlAlertSink;
pub use period::{Period, PeriodRange};
pub use record::{AlertEvent, Direction, Observation};
pub use report::{ReportConfig, ReportFormatter, ReportKind, ReportTable};
pub use sink::AlertSink;
pub use sink_backend::{AlertSinkBackend, SinkError};
pub use sqlite_sink::SqliteAlertSink;
pub use store::{AlertSummary, MetricAggregate, RecordStore, StoreError};
