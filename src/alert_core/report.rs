//! Dashboard report shaping: growth tables and chart-ready series

use super::error::AnalyticsError;
use super::period::PeriodRange;
use super::record::Observation;
use super::store::RecordStore;
use serde::Serialize;

/// The four dashboard report shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Revenue,
    Sales,
    Margin,
    Trend,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Revenue => "revenue",
            ReportKind::Sales => "sales",
            ReportKind::Margin => "margin",
            ReportKind::Trend => "trend",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "revenue" => Some(ReportKind::Revenue),
            "sales" => Some(ReportKind::Sales),
            "margin" => Some(ReportKind::Margin),
            "trend" => Some(ReportKind::Trend),
            _ => None,
        }
    }

    pub fn all() -> [ReportKind; 4] {
        [
            ReportKind::Revenue,
            ReportKind::Sales,
            ReportKind::Margin,
            ReportKind::Trend,
        ]
    }
}

/// Maps report kinds to stored metric names.
///
/// Passed in at construction so callers can point the dashboard shapes at
/// their own series names; defaults match the sample dataset.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub revenue_metric: String,
    pub sales_metric: String,
    pub margin_metric: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            revenue_metric: "total_revenue".to_string(),
            sales_metric: "total_sales".to_string(),
            margin_metric: "profit_margin".to_string(),
        }
    }
}

/// One table row: the period's value plus growth against the prior row.
///
/// Growth is undefined for the first period in range (no prior to compare)
/// and when the prior value is zero.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub period: String,
    pub value: f64,
    pub growth_pct: Option<f64>,
}

/// Chart-ready series: parallel label/value vectors
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub metric: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct ReportTable {
    pub report_type: String,
    pub metric: String,
    pub rows: Vec<ReportRow>,
    pub series: Vec<ChartSeries>,
    pub generated_at: i64,
}

pub struct ReportFormatter {
    config: ReportConfig,
}

impl ReportFormatter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ReportConfig::default())
    }

    /// The metric a report kind's table follows; trend leads with revenue
    pub fn metric_for(&self, kind: ReportKind) -> &str {
        match kind {
            ReportKind::Revenue | ReportKind::Trend => &self.config.revenue_metric,
            ReportKind::Sales => &self.config.sales_metric,
            ReportKind::Margin => &self.config.margin_metric,
        }
    }

    /// String-keyed entry point for the routing layer; unknown tags are
    /// `NotFound`
    pub fn format_named(
        &self,
        store: &RecordStore,
        report_type: &str,
        range: &PeriodRange,
    ) -> Result<ReportTable, AnalyticsError> {
        let kind = ReportKind::from_str(report_type).ok_or_else(|| {
            AnalyticsError::NotFound(format!("report type '{}'", report_type))
        })?;
        self.format_report(store, kind, range)
    }

    /// Shape one report: (period, value, growth) rows plus chart series.
    ///
    /// Trend bundles all three dashboard series in the chart; the other
    /// kinds carry their single metric. Series whose metric has no stored
    /// observations are left out of the trend chart, but the table's own
    /// metric must exist.
    pub fn format_report(
        &self,
        store: &RecordStore,
        kind: ReportKind,
        range: &PeriodRange,
    ) -> Result<ReportTable, AnalyticsError> {
        if range.is_empty() {
            return Err(AnalyticsError::InvalidRange(format!(
                "empty range {}",
                range
            )));
        }

        let metric = self.metric_for(kind);
        if !store.has_metric(metric)? {
            return Err(AnalyticsError::NotFound(format!("metric '{}'", metric)));
        }

        let observations = store.query(metric, range)?;
        let rows = growth_rows(&observations);

        let series = match kind {
            ReportKind::Trend => {
                let mut series = Vec::new();
                for name in [
                    &self.config.revenue_metric,
                    &self.config.sales_metric,
                    &self.config.margin_metric,
                ] {
                    if !store.has_metric(name)? {
                        continue;
                    }
                    series.push(chart_series(name, &store.query(name, range)?));
                }
                series
            }
            _ => vec![chart_series(metric, &observations)],
        };

        Ok(ReportTable {
            report_type: kind.as_str().to_string(),
            metric: metric.to_string(),
            rows,
            series,
            generated_at: chrono::Utc::now().timestamp(),
        })
    }
}

fn growth_rows(observations: &[Observation]) -> Vec<ReportRow> {
    let mut rows = Vec::with_capacity(observations.len());
    let mut prior: Option<f64> = None;

    for obs in observations {
        let growth_pct = match prior {
            Some(prev) if prev != 0.0 => Some((obs.value - prev) / prev * 100.0),
            _ => None,
        };
        rows.push(ReportRow {
            period: obs.period.to_string(),
            value: obs.value,
            growth_pct,
        });
        prior = Some(obs.value);
    }

    rows
}

fn chart_series(metric: &str, observations: &[Observation]) -> ChartSeries {
    ChartSeries {
        metric: metric.to_string(),
        labels: observations.iter().map(|o| o.period.to_string()).collect(),
        values: observations.iter().map(|o| o.value).collect(),
    }
}
