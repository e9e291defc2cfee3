//! Unified sink interface for alert events
//!
//! Routes appends to either the JSONL or SQLite backend based on
//! configuration.

use super::jsonl_sink::JsonlAlertSink;
use super::record::AlertEvent;
use super::sink_backend::{AlertSinkBackend, SinkError};
use super::sqlite_sink::SqliteAlertSink;
use crate::config::BackendType;
use std::path::PathBuf;

/// Unified sink that routes to either the JSONL or SQLite backend
pub enum AlertSink {
    Jsonl(JsonlAlertSink),
    Sqlite(SqliteAlertSink),
}

impl AlertSink {
    /// Create a new alert sink based on backend type.
    ///
    /// For SQLite the path is the store's database file; for JSONL it is the
    /// output file to append to.
    pub fn new(backend: BackendType, path: PathBuf) -> Result<Self, SinkError> {
        match backend {
            BackendType::Jsonl => {
                let sink = JsonlAlertSink::new(path)?;
                Ok(AlertSink::Jsonl(sink))
            }
            BackendType::Sqlite => {
                let sink = SqliteAlertSink::new(path)?;
                Ok(AlertSink::Sqlite(sink))
            }
        }
    }

    pub async fn write_alert(&mut self, event: &AlertEvent) -> Result<(), SinkError> {
        match self {
            AlertSink::Jsonl(s) => s.write_alert(event).await,
            AlertSink::Sqlite(s) => s.write_alert(event).await,
        }
    }

    pub async fn flush(&mut self) -> Result<(), SinkError> {
        match self {
            AlertSink::Jsonl(s) => s.flush().await,
            AlertSink::Sqlite(s) => s.flush().await,
        }
    }

    /// Get backend type for logging
    pub fn backend_type(&self) -> &'static str {
        match self {
            AlertSink::Jsonl(_) => "JSONL",
            AlertSink::Sqlite(_) => "SQLite",
        }
    }
}
