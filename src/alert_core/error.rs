//! Typed failures returned by the evaluator, analyzer, and formatter

use super::sink_backend::SinkError;
use super::store::StoreError;

#[derive(Debug)]
pub enum AnalyticsError {
    /// Unknown metric name or report type
    NotFound(String),
    /// Empty or malformed period range
    InvalidRange(String),
    /// Correlation over fewer than 2 aligned points, or a degenerate series
    InsufficientData(String),
    Store(StoreError),
    Sink(SinkError),
}

impl From<StoreError> for AnalyticsError {
    fn from(err: StoreError) -> Self {
        AnalyticsError::Store(err)
    }
}

impl From<SinkError> for AnalyticsError {
    fn from(err: SinkError) -> Self {
        AnalyticsError::Sink(err)
    }
}

impl std::fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyticsError::NotFound(what) => write!(f, "Not found: {}", what),
            AnalyticsError::InvalidRange(msg) => write!(f, "Invalid period range: {}", msg),
            AnalyticsError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            AnalyticsError::Store(e) => write!(f, "Store error: {}", e),
            AnalyticsError::Sink(e) => write!(f, "Sink error: {}", e),
        }
    }
}

impl std::error::Error for AnalyticsError {}
