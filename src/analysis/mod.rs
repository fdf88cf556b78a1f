//! Analysis modules.
//!
//! The aggregator holds the six metric queries; `DashboardMetrics` runs
//! them together against one filter context.

pub mod aggregator;

pub use aggregator::*;

use crate::filter::FilterContext;
use crate::models::{
    BucketCount, DomainMedian, ResultSet, StatusCount, TierCount, TrendPoint, ValidatorBacklog,
    Visualization,
};
use crate::store::FactStore;
use serde::Serialize;
use tracing::debug;

/// Every dashboard view, computed from the same filter context.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    pub overdue_trend: ResultSet<TrendPoint>,
    pub open_vs_closed: ResultSet<StatusCount>,
    pub median_days_overdue: ResultSet<DomainMedian>,
    pub sla_breach_buckets: ResultSet<BucketCount>,
    pub backlog_by_validator: ResultSet<ValidatorBacklog>,
    pub risk_tier_distribution: ResultSet<TierCount>,
}

impl DashboardMetrics {
    /// Compute all six views for `filter`.
    pub fn compute(store: &FactStore, filter: &FilterContext) -> Self {
        let metrics = Self {
            overdue_trend: ResultSet {
                name: "overdue_trend",
                title: "Overdue Review Trend",
                visualization: Visualization::TimeSeries,
                columns: &["snapshot_month", "overdue_count"],
                rows: overdue_trend(store, filter),
            },
            open_vs_closed: ResultSet {
                name: "open_vs_closed",
                title: "Open vs Closed Reviews",
                visualization: Visualization::StackedArea,
                columns: &["snapshot_month", "review_status", "count"],
                rows: open_vs_closed(store, filter),
            },
            median_days_overdue: ResultSet {
                name: "median_days_overdue",
                title: "Median Days Overdue by Domain",
                visualization: Visualization::HorizontalBar,
                columns: &["business_domain", "median_days_overdue"],
                rows: median_days_overdue(store, filter),
            },
            sla_breach_buckets: ResultSet {
                name: "sla_breach_buckets",
                title: "SLA Breach Buckets",
                visualization: Visualization::Donut,
                columns: &["sla_bucket", "count"],
                rows: sla_breach_buckets(store, filter),
            },
            backlog_by_validator: ResultSet {
                name: "backlog_by_validator",
                title: "Open Backlog by Lead Validator",
                visualization: Visualization::HorizontalBar,
                columns: &["lead_validator", "open_reviews"],
                rows: backlog_by_validator(store, filter),
            },
            risk_tier_distribution: ResultSet {
                name: "risk_tier_distribution",
                title: "Risk Tier Distribution",
                visualization: Visualization::Donut,
                columns: &["current_risk_tier", "count"],
                rows: risk_tier_distribution(store, filter),
            },
        };

        debug!(
            "Computed metrics for {}: {} trend point(s), {} status row(s), {} median(s), {} bucket(s), {} validator(s), {} tier(s)",
            filter.period(),
            metrics.overdue_trend.len(),
            metrics.open_vs_closed.len(),
            metrics.median_days_overdue.len(),
            metrics.sla_breach_buckets.len(),
            metrics.backlog_by_validator.len(),
            metrics.risk_tier_distribution.len()
        );

        metrics
    }

    /// True when every view is empty.
    pub fn is_empty(&self) -> bool {
        self.overdue_trend.is_empty()
            && self.open_vs_closed.is_empty()
            && self.median_days_overdue.is_empty()
            && self.sla_breach_buckets.is_empty()
            && self.backlog_by_validator.is_empty()
            && self.risk_tier_distribution.is_empty()
    }

    /// Overdue reviews in the selected period (sum over SLA buckets).
    pub fn overdue_in_period(&self) -> usize {
        self.sla_breach_buckets.rows.iter().map(|b| b.count).sum()
    }

    /// Open reviews in the selected period (sum over validators).
    pub fn open_in_period(&self) -> usize {
        self.backlog_by_validator
            .rows
            .iter()
            .map(|b| b.open_reviews)
            .sum()
    }

    /// Reviews in the selected period (sum over risk tiers).
    pub fn reviews_in_period(&self) -> usize {
        self.risk_tier_distribution.rows.iter().map(|t| t.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::fixture_store;

    #[test]
    fn test_compute_declares_schema_and_visualization() {
        let store = fixture_store();
        let filter = FilterContext::defaults(&store).unwrap();
        let metrics = DashboardMetrics::compute(&store, &filter);

        assert_eq!(metrics.overdue_trend.visualization, Visualization::TimeSeries);
        assert_eq!(metrics.sla_breach_buckets.columns, &["sla_bucket", "count"]);
        assert_eq!(metrics.overdue_in_period(), 3);
        assert_eq!(metrics.open_in_period(), 3);
        assert_eq!(metrics.reviews_in_period(), 5);
    }

    #[test]
    fn test_empty_domain_selection_yields_empty_views() {
        let store = fixture_store();
        for period in store.list_snapshot_periods() {
            let filter = FilterContext::new(&store, period.as_str(), Vec::<&str>::new()).unwrap();
            let metrics = DashboardMetrics::compute(&store, &filter);
            assert!(metrics.is_empty());
        }
    }

    #[test]
    fn test_serializes_named_result_sets() {
        let store = fixture_store();
        let filter = FilterContext::defaults(&store).unwrap();
        let metrics = DashboardMetrics::compute(&store, &filter);

        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["backlog_by_validator"]["visualization"], "horizontal_bar");
        assert_eq!(
            json["backlog_by_validator"]["rows"][0]["lead_validator"],
            "Alice Moreno"
        );
        assert_eq!(json["sla_breach_buckets"]["rows"][0]["sla_bucket"], "0–30");
    }
}
