//! Persisted record types: metric observations and alert events

use super::period::Period;
use serde::{Deserialize, Serialize};

/// One stored metric observation: a named value for one period.
///
/// (period, metric) is unique per store; observations are immutable once
/// written. Corrections land as new periods, never in-place edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub period: Period,
    pub metric: String,
    pub value: f64,
    pub source: Option<String>,
    pub recorded_at: i64,
}

impl Observation {
    pub fn new(period: Period, metric: impl Into<String>, value: f64) -> Self {
        Self {
            period,
            metric: metric.into(),
            value,
            source: None,
            recorded_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Annual observation, the common case for the bond and dashboard series
    pub fn annual(year: i32, metric: impl Into<String>, value: f64) -> Self {
        Self::new(Period::annual(year), metric, value)
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Which side of the threshold counts as a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "above")]
    Above,
    #[serde(rename = "below")]
    Below,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "above" => Some(Direction::Above),
            "below" => Some(Direction::Below),
            _ => None,
        }
    }
}

/// A recorded threshold violation. Append-only: alert events are never
/// mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub period: Period,
    pub metric: String,
    pub observed: f64,
    pub threshold: f64,
    pub direction: Direction,
    pub evaluated_at: i64,
}
