//! Pearson correlation between metric series aligned by period

use super::error::AnalyticsError;
use super::period::{Period, PeriodRange};
use super::store::RecordStore;
use serde::Serialize;
use std::collections::BTreeMap;

/// Pairwise correlation over one period range. Ephemeral: computed on
/// demand, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationResult {
    pub metric_a: String,
    pub metric_b: String,
    pub coefficient: f64,
    /// Aligned pairs the coefficient was computed over
    pub samples: usize,
}

pub struct CorrelationAnalyzer;

impl CorrelationAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Correlate two metric series over a period range.
    ///
    /// Series are joined on period; periods where either side is missing are
    /// discarded. Fewer than 2 aligned pairs, or a series with zero variance,
    /// leaves the coefficient undefined and fails with `InsufficientData`.
    pub fn correlate(
        &self,
        store: &RecordStore,
        metric_a: &str,
        metric_b: &str,
        range: &PeriodRange,
    ) -> Result<CorrelationResult, AnalyticsError> {
        if range.is_empty() {
            return Err(AnalyticsError::InvalidRange(format!(
                "empty range {}",
                range
            )));
        }

        for metric in [metric_a, metric_b] {
            if !store.has_metric(metric)? {
                return Err(AnalyticsError::NotFound(format!("metric '{}'", metric)));
            }
        }

        // Index series A by period for the alignment join
        let series_a: BTreeMap<Period, f64> = store
            .query(metric_a, range)?
            .into_iter()
            .map(|obs| (obs.period, obs.value))
            .collect();

        let pairs: Vec<(f64, f64)> = store
            .query(metric_b, range)?
            .into_iter()
            .filter_map(|obs| series_a.get(&obs.period).map(|&a| (a, obs.value)))
            .collect();

        if pairs.len() < 2 {
            return Err(AnalyticsError::InsufficientData(format!(
                "{} aligned pairs for '{}' vs '{}', need at least 2",
                pairs.len(),
                metric_a,
                metric_b
            )));
        }

        let coefficient = pearson(&pairs).ok_or_else(|| {
            AnalyticsError::InsufficientData(format!(
                "zero variance in '{}' or '{}' over {}",
                metric_a, metric_b, range
            ))
        })?;

        Ok(CorrelationResult {
            metric_a: metric_a.to_string(),
            metric_b: metric_b.to_string(),
            coefficient,
            samples: pairs.len(),
        })
    }

    /// Correlation for every unordered metric pair
    pub fn matrix(
        &self,
        store: &RecordStore,
        metrics: &[String],
        range: &PeriodRange,
    ) -> Result<Vec<CorrelationResult>, AnalyticsError> {
        let mut results = Vec::new();

        for (i, metric_a) in metrics.iter().enumerate() {
            for metric_b in &metrics[i + 1..] {
                results.push(self.correlate(store, metric_a, metric_b, range)?);
            }
        }

        Ok(results)
    }
}

/// Standard Pearson coefficient; None when undefined (under 2 points or
/// zero variance on either side). No smoothing or outlier removal.
fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return None;
    }

    // Floating-point roundoff can push |r| a hair past 1
    Some((cov / denom).clamp(-1.0, 1.0))
}
