//! Threshold evaluation with configurable boundary and direction

use super::error::AnalyticsError;
use super::period::PeriodRange;
use super::record::{AlertEvent, Direction};
use super::store::RecordStore;

/// A configured numeric boundary for one metric.
///
/// Set once at construction and applied uniformly across evaluation calls.
#[derive(Debug, Clone)]
pub struct AlertThreshold {
    pub metric: String,
    pub value: f64,
    pub direction: Direction,
}

impl AlertThreshold {
    pub fn new(metric: impl Into<String>, value: f64, direction: Direction) -> Self {
        Self {
            metric: metric.into(),
            value,
            direction,
        }
    }
}

/// Evaluates one threshold against stored observations.
///
/// Stateless per invocation; each call is a pure function of the records it
/// reads. Persistence of the resulting events is the caller's choice.
pub struct AlertEvaluator {
    threshold: AlertThreshold,
}

impl AlertEvaluator {
    pub fn new(threshold: AlertThreshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> &AlertThreshold {
        &self.threshold
    }

    /// The violation predicate: strictly beyond the boundary on the
    /// configured side.
    pub fn violates(&self, value: f64) -> bool {
        match self.threshold.direction {
            Direction::Above => value > self.threshold.value,
            Direction::Below => value < self.threshold.value,
        }
    }

    /// Evaluate the threshold over a period range.
    ///
    /// Returns the violating observations as alert events, period ascending.
    /// An empty range is `InvalidRange`; a metric the store has never seen is
    /// `NotFound`. A range with records but no violations is an empty Ok.
    /// Periods without a row for this metric are skipped, not violations.
    pub fn evaluate(
        &self,
        store: &RecordStore,
        range: &PeriodRange,
    ) -> Result<Vec<AlertEvent>, AnalyticsError> {
        self.evaluate_at(store, range, chrono::Utc::now().timestamp())
    }

    /// Evaluate with a caller-supplied evaluation timestamp.
    ///
    /// The monitor loop passes one clock reading through evaluation and
    /// dedup so both see the same instant; tests pass a fixed value.
    pub fn evaluate_at(
        &self,
        store: &RecordStore,
        range: &PeriodRange,
        evaluated_at: i64,
    ) -> Result<Vec<AlertEvent>, AnalyticsError> {
        if range.is_empty() {
            return Err(AnalyticsError::InvalidRange(format!(
                "empty range {}",
                range
            )));
        }

        if !store.has_metric(&self.threshold.metric)? {
            return Err(AnalyticsError::NotFound(format!(
                "metric '{}'",
                self.threshold.metric
            )));
        }

        let events = store
            .query(&self.threshold.metric, range)?
            .into_iter()
            .filter(|obs| self.violates(obs.value))
            .map(|obs| AlertEvent {
                period: obs.period,
                metric: obs.metric,
                observed: obs.value,
                threshold: self.threshold.value,
                direction: self.threshold.direction,
                evaluated_at,
            })
            .collect();

        Ok(events)
    }

    /// Evaluate, then drop events already alerted within the dedup window.
    ///
    /// Dedup is keyed on (metric, period) against the store's persisted alert
    /// history, mirroring the check-then-append cycle of the monitor loop.
    pub fn evaluate_new(
        &self,
        store: &RecordStore,
        range: &PeriodRange,
        now: i64,
        dedup_window_secs: i64,
    ) -> Result<Vec<AlertEvent>, AnalyticsError> {
        let since = now - dedup_window_secs;
        let mut fresh = Vec::new();

        for event in self.evaluate_at(store, range, now)? {
            if store.recent_alert_exists(&event.metric, &event.period, since)? {
                continue;
            }
            fresh.push(event);
        }

        Ok(fresh)
    }
}
