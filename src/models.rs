//! Data models for governance metrics.
//!
//! This module contains the fact and dimension rows read from the source
//! tables, the row types of every aggregate result set, and the report
//! structure handed to the presentation layer.

use crate::analysis::DashboardMetrics;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Review status that counts towards the open backlog.
pub const OPEN_STATUS: &str = "Open";

/// Column names of the fact source, in source order.
pub const FACT_COLUMNS: [&str; 8] = [
    "snapshot_month",
    "business_domain",
    "model_id",
    "review_status",
    "overdue_flag",
    "days_overdue",
    "current_risk_tier",
    "lead_validator_person_id",
];

/// Column names of the model dimension.
pub const MODEL_COLUMNS: [&str; 2] = ["model_id", "business_domain"];

/// Column names of the person dimension.
pub const PERSON_COLUMNS: [&str; 2] = ["person_id", "person_name"];

/// A monthly snapshot key such as `2025-03` (or `2025-03-31`).
///
/// Ordered chronologically by the parsed date; the original text is kept
/// so exports reproduce the source value exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotMonth {
    raw: String,
    date: NaiveDate,
}

impl SnapshotMonth {
    /// Returns the value as it appeared in the source.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for SnapshotMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let parsed = if raw.len() == 7 {
            NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        } else {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        };

        parsed
            .map(|date| Self {
                raw: raw.to_string(),
                date,
            })
            .map_err(|_| {
                format!(
                    "invalid snapshot month '{}' (expected YYYY-MM or YYYY-MM-DD)",
                    raw
                )
            })
    }
}

impl TryFrom<String> for SnapshotMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SnapshotMonth> for String {
    fn from(month: SnapshotMonth) -> Self {
        month.raw
    }
}

impl PartialOrd for SnapshotMonth {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SnapshotMonth {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for SnapshotMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Whether a review was past its scheduled completion date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverdueFlag {
    #[serde(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    No,
}

/// One model-review-backlog observation from the monthly fact table.
///
/// Field order matches the fact source columns so serialization
/// reproduces the source header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRow {
    pub snapshot_month: SnapshotMonth,
    pub business_domain: String,
    pub model_id: String,
    pub review_status: String,
    pub overdue_flag: OverdueFlag,
    /// Only meaningful when `overdue_flag` is `Y`.
    pub days_overdue: Option<u32>,
    pub current_risk_tier: String,
    pub lead_validator_person_id: Option<String>,
}

impl FactRow {
    pub fn is_overdue(&self) -> bool {
        self.overdue_flag == OverdueFlag::Yes
    }

    pub fn is_open(&self) -> bool {
        self.review_status == OPEN_STATUS
    }

    /// Day count of an overdue row; `None` for rows that are not overdue.
    ///
    /// `FactStore` rejects overdue rows without a day count, so every
    /// overdue row in a store yields `Some`.
    pub fn overdue_days(&self) -> Option<u32> {
        if self.is_overdue() {
            self.days_overdue
        } else {
            None
        }
    }
}

/// Row of the model dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDim {
    pub model_id: String,
    pub business_domain: String,
}

/// Row of the person dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDim {
    pub person_id: String,
    pub person_name: String,
}

/// Count of overdue reviews in one snapshot period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub snapshot_month: SnapshotMonth,
    pub overdue_count: usize,
}

/// Count of reviews with a given status in one snapshot period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub snapshot_month: SnapshotMonth,
    pub review_status: String,
    pub count: usize,
}

/// Median days overdue for one business domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainMedian {
    pub business_domain: String,
    pub median_days_overdue: f64,
}

/// Coarse classification of how long a review has been overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SlaBucket {
    #[serde(rename = "0–30")]
    UpTo30,
    #[serde(rename = "31–60")]
    UpTo60,
    #[serde(rename = "61–90")]
    UpTo90,
    #[serde(rename = "90+")]
    Over90,
}

impl SlaBucket {
    /// Assign a day count to exactly one bucket.
    pub fn classify(days_overdue: u32) -> Self {
        match days_overdue {
            0..=30 => SlaBucket::UpTo30,
            31..=60 => SlaBucket::UpTo60,
            61..=90 => SlaBucket::UpTo90,
            _ => SlaBucket::Over90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SlaBucket::UpTo30 => "0–30",
            SlaBucket::UpTo60 => "31–60",
            SlaBucket::UpTo90 => "61–90",
            SlaBucket::Over90 => "90+",
        }
    }
}

impl fmt::Display for SlaBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Count of overdue reviews in one SLA bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub sla_bucket: SlaBucket,
    pub count: usize,
}

/// Resolved lead validator of a review.
///
/// Reviews without a validator id, or whose id has no match in the person
/// dimension, resolve to `Unassigned` instead of a blank name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValidatorLabel {
    Named(String),
    Unassigned,
}

impl ValidatorLabel {
    pub const UNASSIGNED: &'static str = "Unassigned";

    /// Label for a resolved person. A person whose name collides with the
    /// `Unassigned` label is qualified with their id.
    pub fn named(person_id: &str, person_name: &str) -> Self {
        if person_name.eq_ignore_ascii_case(Self::UNASSIGNED) {
            ValidatorLabel::Named(format!("{} ({})", person_name, person_id))
        } else {
            ValidatorLabel::Named(person_name.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ValidatorLabel::Named(name) => name,
            ValidatorLabel::Unassigned => Self::UNASSIGNED,
        }
    }
}

impl fmt::Display for ValidatorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ValidatorLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Open review count for one lead validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorBacklog {
    pub lead_validator: ValidatorLabel,
    pub open_reviews: usize,
}

/// Count of reviews in one risk tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierCount {
    pub current_risk_tier: String,
    pub count: usize,
}

/// Intended visual form of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visualization {
    /// Line chart over snapshot periods.
    TimeSeries,
    /// Stacked area over a per-status pivot.
    StackedArea,
    /// Ranked horizontal bars.
    HorizontalBar,
    /// Proportions as a donut.
    Donut,
}

impl fmt::Display for Visualization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visualization::TimeSeries => write!(f, "time series"),
            Visualization::StackedArea => write!(f, "stacked area"),
            Visualization::HorizontalBar => write!(f, "horizontal bar"),
            Visualization::Donut => write!(f, "donut"),
        }
    }
}

/// A named aggregate with a fixed column schema.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet<T> {
    pub name: &'static str,
    pub title: &'static str,
    pub visualization: Visualization,
    pub columns: &'static [&'static str],
    pub rows: Vec<T>,
}

impl<T> ResultSet<T> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Disagreement between the fact table and the model dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainMismatch {
    /// The fact row's domain is not enumerated by the model dimension.
    UnknownDomain {
        snapshot_month: SnapshotMonth,
        model_id: String,
        business_domain: String,
    },
    /// The model dimension maps the model to a different domain.
    ModelDomainDisagrees {
        snapshot_month: SnapshotMonth,
        model_id: String,
        fact_domain: String,
        dimension_domain: String,
    },
}

impl fmt::Display for DomainMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainMismatch::UnknownDomain {
                snapshot_month,
                model_id,
                business_domain,
            } => write!(
                f,
                "{} {}: domain '{}' is not in the model dimension",
                snapshot_month, model_id, business_domain
            ),
            DomainMismatch::ModelDomainDisagrees {
                snapshot_month,
                model_id,
                fact_domain,
                dimension_domain,
            } => write!(
                f,
                "{} {}: fact domain '{}' but model dimension says '{}'",
                snapshot_month, model_id, fact_domain, dimension_domain
            ),
        }
    }
}

/// Metadata about a generated dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Directory the source tables were read from.
    pub data_dir: String,
    /// Selected snapshot period.
    pub snapshot_month: SnapshotMonth,
    /// Selected business domains, ascending.
    pub domains: Vec<String>,
    /// Number of fact rows loaded across all periods.
    pub fact_rows_loaded: usize,
    /// Number of fact rows in the current selection.
    pub snapshot_rows: usize,
    /// Time spent loading and computing, in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub metrics: DashboardMetrics,
    /// Reconciliation findings between the fact table and the model dimension.
    pub data_quality: Vec<DomainMismatch>,
    /// Leading rows of the raw snapshot.
    pub snapshot_preview: Vec<FactRow>,
}
