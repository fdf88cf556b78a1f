//! Governance metric aggregation.
//!
//! Six independent views over the fact store. Each is a pure function of
//! the store and a filter context, so they can be computed in any order
//! and tested in isolation.

use crate::filter::FilterContext;
use crate::models::{
    BucketCount, DomainMedian, FactRow, SlaBucket, SnapshotMonth, StatusCount, TierCount,
    TrendPoint, ValidatorBacklog, ValidatorLabel,
};
use crate::store::{FactStore, PeriodScope};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

/// Overdue review count per snapshot period, across the full history.
///
/// Periods without overdue rows are omitted rather than zero-filled.
pub fn overdue_trend(store: &FactStore, filter: &FilterContext) -> Vec<TrendPoint> {
    let mut counts: BTreeMap<&SnapshotMonth, usize> = BTreeMap::new();

    for row in store
        .query(filter, PeriodScope::AllPeriods)
        .filter(|r| r.is_overdue())
    {
        *counts.entry(&row.snapshot_month).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(month, overdue_count)| TrendPoint {
            snapshot_month: month.clone(),
            overdue_count,
        })
        .collect()
}

/// Review count per (period, status), in long format.
///
/// Spans every period. Any status value present in the data shows up;
/// pivoting into per-status series is left to the presentation layer.
pub fn open_vs_closed(store: &FactStore, filter: &FilterContext) -> Vec<StatusCount> {
    let mut counts: BTreeMap<(&SnapshotMonth, &str), usize> = BTreeMap::new();

    for row in store.query(filter, PeriodScope::AllPeriods) {
        *counts
            .entry((&row.snapshot_month, row.review_status.as_str()))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((month, status), count)| StatusCount {
            snapshot_month: month.clone(),
            review_status: status.to_string(),
            count,
        })
        .collect()
}

/// Median days overdue per domain in the selected period, highest first.
pub fn median_days_overdue(store: &FactStore, filter: &FilterContext) -> Vec<DomainMedian> {
    let mut by_domain: HashMap<&str, Vec<u32>> = HashMap::new();

    for row in store.query(filter, PeriodScope::Selected) {
        if let Some(days) = row.overdue_days() {
            by_domain
                .entry(row.business_domain.as_str())
                .or_default()
                .push(days);
        }
    }

    let mut medians: Vec<DomainMedian> = by_domain
        .into_iter()
        .filter_map(|(domain, mut days)| {
            median(&mut days).map(|m| DomainMedian {
                business_domain: domain.to_string(),
                median_days_overdue: m,
            })
        })
        .collect();

    medians.sort_by(|a, b| {
        b.median_days_overdue
            .total_cmp(&a.median_days_overdue)
            .then_with(|| a.business_domain.cmp(&b.business_domain))
    });

    medians
}

/// Overdue review count per SLA bucket in the selected period.
///
/// Empty buckets are omitted.
pub fn sla_breach_buckets(store: &FactStore, filter: &FilterContext) -> Vec<BucketCount> {
    let mut counts: BTreeMap<SlaBucket, usize> = BTreeMap::new();

    for days in store
        .query(filter, PeriodScope::Selected)
        .filter_map(FactRow::overdue_days)
    {
        *counts.entry(SlaBucket::classify(days)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(sla_bucket, count)| BucketCount { sla_bucket, count })
        .collect()
}

/// Open review count per lead validator in the selected period.
///
/// Reviews with no validator, or a validator missing from the person
/// dimension, are counted under `Unassigned`. Sorted by count descending,
/// then by name with `Unassigned` last.
pub fn backlog_by_validator(store: &FactStore, filter: &FilterContext) -> Vec<ValidatorBacklog> {
    let mut counts: HashMap<ValidatorLabel, usize> = HashMap::new();

    for row in store
        .query(filter, PeriodScope::Selected)
        .filter(|r| r.is_open())
    {
        let label = row
            .lead_validator_person_id
            .as_deref()
            .and_then(|id| store.person_name(id).map(|name| ValidatorLabel::named(id, name)))
            .unwrap_or(ValidatorLabel::Unassigned);

        *counts.entry(label).or_default() += 1;
    }

    let mut backlog: Vec<ValidatorBacklog> = counts
        .into_iter()
        .map(|(lead_validator, open_reviews)| ValidatorBacklog {
            lead_validator,
            open_reviews,
        })
        .collect();

    backlog.sort_by(|a, b| {
        b.open_reviews
            .cmp(&a.open_reviews)
            .then_with(|| a.lead_validator.cmp(&b.lead_validator))
    });

    backlog
}

/// Review count per current risk tier in the selected period.
pub fn risk_tier_distribution(store: &FactStore, filter: &FilterContext) -> Vec<TierCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for row in store.query(filter, PeriodScope::Selected) {
        *counts.entry(row.current_risk_tier.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(tier, count)| TierCount {
            current_risk_tier: tier.to_string(),
            count,
        })
        .collect()
}

/// Median of a sample; the mean of the two middle values for even sizes.
///
/// Returns `None` for an empty sample. Sorts `values` in place.
pub fn median(values: &mut [u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_unstable();
    let mid = values.len() / 2;

    if values.len() % 2 == 0 {
        Some((f64::from(values[mid - 1]) + f64::from(values[mid])) / 2.0)
    } else {
        Some(f64::from(values[mid]))
    }
}

/// Rank validators by open reviews and keep the top `n`.
pub fn top_validators(backlog: &[ValidatorBacklog], n: usize) -> Vec<&ValidatorBacklog> {
    let mut ranked: Vec<&ValidatorBacklog> = backlog.iter().collect();
    ranked.sort_by_key(|b| Reverse(b.open_reviews));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{fact, fixture_store, model, person};
    use std::path::Path;

    /// The three-row scenario: two Credit reviews and one Fraud review.
    fn scenario_store() -> FactStore {
        FactStore::from_tables(
            Path::new("memory"),
            vec![
                fact("2025-01", "Credit", "Open", true, 45, "Tier1", Some("p1")),
                fact("2025-01", "Credit", "Open", true, 10, "Tier2", None),
                fact("2025-01", "Fraud", "Closed", false, 0, "Tier1", Some("p2")),
            ],
            vec![model("m1", "Credit"), model("m2", "Fraud")],
            vec![person("p1", "Pat Lee"), person("p2", "Sam Roe")],
        )
        .unwrap()
    }

    fn credit_filter(store: &FactStore) -> FilterContext {
        FilterContext::new(store, "2025-01", ["Credit"]).unwrap()
    }

    #[test]
    fn test_scenario_sla_buckets() {
        let store = scenario_store();
        let buckets = sla_breach_buckets(&store, &credit_filter(&store));

        assert_eq!(
            buckets,
            vec![
                BucketCount {
                    sla_bucket: SlaBucket::UpTo30,
                    count: 1
                },
                BucketCount {
                    sla_bucket: SlaBucket::UpTo60,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_scenario_risk_tiers() {
        let store = scenario_store();
        let tiers = risk_tier_distribution(&store, &credit_filter(&store));

        let pairs: Vec<(&str, usize)> = tiers
            .iter()
            .map(|t| (t.current_risk_tier.as_str(), t.count))
            .collect();
        assert_eq!(pairs, vec![("Tier1", 1), ("Tier2", 1)]);
    }

    #[test]
    fn test_scenario_validator_backlog() {
        let store = scenario_store();
        let backlog = backlog_by_validator(&store, &credit_filter(&store));

        assert_eq!(
            backlog,
            vec![
                ValidatorBacklog {
                    lead_validator: ValidatorLabel::Named("Pat Lee".to_string()),
                    open_reviews: 1
                },
                ValidatorBacklog {
                    lead_validator: ValidatorLabel::Unassigned,
                    open_reviews: 1
                },
            ]
        );
    }

    #[test]
    fn test_scenario_median() {
        let store = scenario_store();
        let medians = median_days_overdue(&store, &credit_filter(&store));

        assert_eq!(medians.len(), 1);
        assert_eq!(medians[0].business_domain, "Credit");
        assert_eq!(medians[0].median_days_overdue, 27.5);
    }

    #[test]
    fn test_median_definition() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [7]), Some(7.0));
        assert_eq!(median(&mut [9, 1, 5]), Some(5.0));
        assert_eq!(median(&mut [40, 10, 30, 20]), Some(25.0));
    }

    #[test]
    fn test_median_is_order_independent() {
        let mut forward = [3, 91, 14, 60, 7, 120];
        let mut reversed = [120, 7, 60, 14, 91, 3];
        let mut shuffled = [60, 3, 120, 91, 7, 14];

        let expected = median(&mut forward);
        assert_eq!(median(&mut reversed), expected);
        assert_eq!(median(&mut shuffled), expected);
        // Sorting in place must not change a second evaluation.
        assert_eq!(median(&mut forward), expected);
    }

    #[test]
    fn test_overdue_trend_spans_history() {
        let store = fixture_store();
        let filter = FilterContext::defaults(&store).unwrap();
        let trend = overdue_trend(&store, &filter);

        let points: Vec<(&str, usize)> = trend
            .iter()
            .map(|p| (p.snapshot_month.as_str(), p.overdue_count))
            .collect();
        assert_eq!(points, vec![("2025-01", 2), ("2025-02", 4), ("2025-03", 3)]);
    }

    #[test]
    fn test_overdue_trend_ignores_selected_period() {
        let store = fixture_store();
        let domains = ["Credit", "Fraud"];

        let trends: Vec<Vec<TrendPoint>> = store
            .list_snapshot_periods()
            .iter()
            .map(|p| {
                let filter = FilterContext::new(&store, p.as_str(), domains).unwrap();
                overdue_trend(&store, &filter)
            })
            .collect();

        assert!(trends.windows(2).all(|w| w[0] == w[1]));

        // Each point equals a direct count for that period.
        let filter = FilterContext::new(&store, "2025-01", domains).unwrap();
        for point in &trends[0] {
            let direct = store
                .query(&filter, PeriodScope::AllPeriods)
                .filter(|r| r.is_overdue() && r.snapshot_month == point.snapshot_month)
                .count();
            assert_eq!(point.overdue_count, direct);
        }
    }

    #[test]
    fn test_overdue_trend_omits_empty_periods() {
        let store = fixture_store();
        let filter = FilterContext::new(&store, "2025-03", ["Forecasting"]).unwrap();
        let trend = overdue_trend(&store, &filter);

        let months: Vec<&str> = trend.iter().map(|p| p.snapshot_month.as_str()).collect();
        assert_eq!(months, vec!["2025-02"]);
    }

    #[test]
    fn test_open_vs_closed_long_format() {
        let store = fixture_store();
        let filter = FilterContext::defaults(&store).unwrap();
        let rows = open_vs_closed(&store, &filter);

        let triples: Vec<(&str, &str, usize)> = rows
            .iter()
            .map(|r| (r.snapshot_month.as_str(), r.review_status.as_str(), r.count))
            .collect();
        assert_eq!(
            triples,
            vec![
                ("2025-01", "Closed", 1),
                ("2025-01", "Open", 3),
                ("2025-02", "Closed", 1),
                ("2025-02", "Open", 4),
                ("2025-03", "Closed", 2),
                ("2025-03", "Open", 3),
            ]
        );
    }

    #[test]
    fn test_open_vs_closed_keeps_unlisted_statuses() {
        let store = FactStore::from_tables(
            Path::new("memory"),
            vec![
                fact("2025-01", "Credit", "Open", false, 0, "Tier1", None),
                fact("2025-01", "Credit", "Deferred", false, 0, "Tier1", None),
            ],
            vec![model("m1", "Credit")],
            vec![],
        )
        .unwrap();
        let filter = FilterContext::defaults(&store).unwrap();
        let statuses: Vec<String> = open_vs_closed(&store, &filter)
            .into_iter()
            .map(|r| r.review_status)
            .collect();
        assert_eq!(statuses, vec!["Deferred", "Open"]);
    }

    #[test]
    fn test_median_ordering_and_omission() {
        let store = fixture_store();
        let filter = FilterContext::defaults(&store).unwrap();
        let medians = median_days_overdue(&store, &filter);

        // Forecasting has no overdue rows in 2025-03.
        let pairs: Vec<(&str, f64)> = medians
            .iter()
            .map(|m| (m.business_domain.as_str(), m.median_days_overdue))
            .collect();
        assert_eq!(pairs, vec![("Fraud", 91.0), ("Credit", 67.5)]);
    }

    #[test]
    fn test_sla_buckets_partition_overdue_rows() {
        let store = fixture_store();
        for period in store.list_snapshot_periods() {
            let filter =
                FilterContext::new(&store, period.as_str(), store.list_business_domains()).unwrap();
            let total: usize = sla_breach_buckets(&store, &filter)
                .iter()
                .map(|b| b.count)
                .sum();
            let overdue = store
                .query(&filter, PeriodScope::Selected)
                .filter(|r| r.is_overdue())
                .count();
            assert_eq!(total, overdue, "period {}", period);
        }
    }

    #[test]
    fn test_validator_backlog_sums_to_open_rows() {
        let store = fixture_store();
        let filter = FilterContext::new(&store, "2025-02", store.list_business_domains()).unwrap();
        let backlog = backlog_by_validator(&store, &filter);

        let total: usize = backlog.iter().map(|b| b.open_reviews).sum();
        let open = store
            .query(&filter, PeriodScope::Selected)
            .filter(|r| r.is_open())
            .count();
        assert_eq!(total, open);

        // P09 has no person record, so it lands in Unassigned.
        let labels: Vec<&str> = backlog.iter().map(|b| b.lead_validator.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Alice Moreno", "Ben Okafor", "Chen Wei", "Unassigned"]
        );
    }

    #[test]
    fn test_person_named_unassigned_stays_distinct() {
        let store = FactStore::from_tables(
            Path::new("memory"),
            vec![
                fact("2025-01", "Credit", "Open", false, 0, "Tier1", Some("p7")),
                fact("2025-01", "Credit", "Open", false, 0, "Tier1", None),
            ],
            vec![model("m1", "Credit")],
            vec![person("p7", "Unassigned")],
        )
        .unwrap();
        let filter = FilterContext::defaults(&store).unwrap();

        let labels: Vec<String> = backlog_by_validator(&store, &filter)
            .iter()
            .map(|b| b.lead_validator.to_string())
            .collect();
        assert_eq!(labels, vec!["Unassigned (p7)", "Unassigned"]);
    }

    #[test]
    fn test_risk_tiers_partition_selection() {
        let store = fixture_store();
        let filter = FilterContext::defaults(&store).unwrap();
        let total: usize = risk_tier_distribution(&store, &filter)
            .iter()
            .map(|t| t.count)
            .sum();
        assert_eq!(total, store.query(&filter, PeriodScope::Selected).count());
    }

    #[test]
    fn test_top_validators() {
        let store = fixture_store();
        let filter = FilterContext::defaults(&store).unwrap();
        let backlog = backlog_by_validator(&store, &filter);
        let top = top_validators(&backlog, 1);

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].lead_validator.as_str(), "Alice Moreno");
        assert_eq!(top[0].open_reviews, 2);
    }
}
