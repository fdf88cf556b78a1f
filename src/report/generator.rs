//! Markdown and JSON report generation.
//!
//! This module renders dashboard result sets as Markdown tables, one
//! section per view, or serializes the whole report as JSON.

use crate::analysis::top_validators;
use crate::config::ReportConfig;
use crate::models::{
    DashboardReport, DomainMismatch, FactRow, ReportMetadata, ResultSet, SlaBucket,
    SnapshotMonth, StatusCount, Visualization, FACT_COLUMNS,
};
use anyhow::Result;
use std::collections::BTreeSet;

const EMPTY_VIEW: &str = "_No data for the current selection._\n\n";
const BAR_WIDTH: usize = 20;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport, options: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Model Governance Dashboard\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report, options));

    if options.include_guide {
        output.push_str(&generate_guide_section());
    }

    output.push_str(&generate_summary_section(report));

    let metrics = &report.metrics;

    output.push_str(&generate_view_section(&metrics.overdue_trend, |p| {
        vec![p.snapshot_month.to_string(), p.overdue_count.to_string()]
    }));
    output.push_str(&generate_open_closed_section(&metrics.open_vs_closed));
    output.push_str(&generate_view_section(&metrics.median_days_overdue, |m| {
        vec![
            m.business_domain.clone(),
            format_number(m.median_days_overdue),
        ]
    }));
    output.push_str(&generate_view_section(&metrics.sla_breach_buckets, |b| {
        vec![b.sla_bucket.to_string(), b.count.to_string()]
    }));
    output.push_str(&generate_view_section(&metrics.backlog_by_validator, |b| {
        vec![b.lead_validator.to_string(), b.open_reviews.to_string()]
    }));
    output.push_str(&generate_view_section(&metrics.risk_tier_distribution, |t| {
        vec![t.current_risk_tier.clone(), t.count.to_string()]
    }));

    if options.include_data_quality && !report.data_quality.is_empty() {
        output.push_str(&generate_data_quality_section(&report.data_quality));
    }

    output.push_str(&generate_snapshot_section(
        &report.snapshot_preview,
        report.metadata.snapshot_rows,
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Data Directory:** `{}`\n", metadata.data_dir));
    section.push_str(&format!("- **Snapshot Month:** {}\n", metadata.snapshot_month));

    let domains = if metadata.domains.is_empty() {
        "_none selected_".to_string()
    } else {
        metadata.domains.join(", ")
    };
    section.push_str(&format!("- **Business Domains:** {}\n", domains));
    section.push_str(&format!(
        "- **Fact Rows Loaded:** {}\n",
        metadata.fact_rows_loaded
    ));
    section.push_str(&format!(
        "- **Rows in Snapshot:** {}\n",
        metadata.snapshot_rows
    ));
    section.push_str(&format!(
        "- **Duration:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &DashboardReport, options: &ReportConfig) -> String {
    let metrics = &report.metrics;
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    if options.include_guide {
        toc.push_str("- [How to Read This Dashboard](#how-to-read-this-dashboard)\n");
    }
    toc.push_str("- [Summary](#summary)\n");

    for title in [
        metrics.overdue_trend.title,
        metrics.open_vs_closed.title,
        metrics.median_days_overdue.title,
        metrics.sla_breach_buckets.title,
        metrics.backlog_by_validator.title,
        metrics.risk_tier_distribution.title,
    ] {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor(title)));
    }

    if options.include_data_quality && !report.data_quality.is_empty() {
        toc.push_str("- [Data Quality](#data-quality)\n");
    }
    toc.push_str("- [Raw Snapshot Data](#raw-snapshot-data)\n\n");

    toc
}

/// Generate the reading guide.
fn generate_guide_section() -> String {
    let mut section = String::new();

    section.push_str("## How to Read This Dashboard\n\n");
    section.push_str(
        "**Overdue Review Trend** counts reviews past their scheduled completion date in every \
         snapshot. A rising line suggests review capacity is under strain.\n\n",
    );
    section.push_str(
        "**Open vs Closed Reviews** compares inflow against completion per snapshot. A \
         persistent gap means backlog is accumulating.\n\n",
    );
    section.push_str(
        "**Median Days Overdue**, **SLA Breach Buckets**, **Open Backlog by Lead Validator** and \
         **Risk Tier Distribution** describe the selected snapshot and should be read together: \
         risk concentrates where long delays overlap with high risk tiers or unassigned \
         validators.\n\n",
    );
    section.push_str(
        "Reviews without a lead validator are listed as **Unassigned**. Overdue reviews \
         without a validator warrant escalation to the model owner.\n\n",
    );

    section
}

/// Generate headline figures for the selected snapshot.
fn generate_summary_section(report: &DashboardReport) -> String {
    let metrics = &report.metrics;
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Reviews | Open | Overdue | Overdue 90+ |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");

    let over_90 = metrics
        .sla_breach_buckets
        .rows
        .iter()
        .filter(|b| b.sla_bucket == SlaBucket::Over90)
        .map(|b| b.count)
        .sum::<usize>();

    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        metrics.reviews_in_period(),
        metrics.open_in_period(),
        metrics.overdue_in_period(),
        over_90
    ));

    if let Some(top) = top_validators(&metrics.backlog_by_validator.rows, 1).first() {
        section.push_str(&format!(
            "Largest open backlog: **{}** ({} review(s)).\n\n",
            top.lead_validator, top.open_reviews
        ));
    }

    section
}

/// Render one two-column result set as a table.
///
/// Horizontal bar views get a text bar, donut views a share column.
fn generate_view_section<T, F>(view: &ResultSet<T>, cells: F) -> String
where
    F: Fn(&T) -> Vec<String>,
{
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", view.title));
    section.push_str(&format!("*Chart: {}*\n\n", view.visualization));

    if view.is_empty() {
        section.push_str(EMPTY_VIEW);
        return section;
    }

    let rows: Vec<Vec<String>> = view.rows.iter().map(&cells).collect();
    let values: Vec<f64> = rows
        .iter()
        .map(|r| r.last().and_then(|v| v.parse().ok()).unwrap_or(0.0))
        .collect();

    let mut header: Vec<&str> = view.columns.to_vec();
    match view.visualization {
        Visualization::HorizontalBar => header.push(""),
        Visualization::Donut => header.push("share"),
        _ => {}
    }

    section.push_str(&format!("| {} |\n", header.join(" | ")));
    section.push_str(&format!(
        "|{}\n",
        header.iter().map(|_| ":---|").collect::<String>()
    ));

    let max = values.iter().cloned().fold(0.0_f64, f64::max);
    let total: f64 = values.iter().sum();

    for (row, value) in rows.iter().zip(&values) {
        let mut cells = row.clone();
        match view.visualization {
            Visualization::HorizontalBar => cells.push(bar(*value, max)),
            Visualization::Donut => cells.push(share(*value, total)),
            _ => {}
        }
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Render the long-format status counts as a wide per-status table.
fn generate_open_closed_section(view: &ResultSet<StatusCount>) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", view.title));
    section.push_str(&format!("*Chart: {}*\n\n", view.visualization));

    if view.is_empty() {
        section.push_str(EMPTY_VIEW);
        return section;
    }

    let (statuses, periods) = pivot_status_counts(&view.rows);

    section.push_str(&format!("| snapshot_month | {} |\n", statuses.join(" | ")));
    section.push_str(&format!(
        "|:---|{}\n",
        statuses.iter().map(|_| ":---:|").collect::<String>()
    ));

    for (month, counts) in periods {
        let cells: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
        section.push_str(&format!("| {} | {} |\n", month, cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Pivot (period, status, count) rows into one row per period with a
/// column per status. Missing combinations are 0.
pub fn pivot_status_counts(rows: &[StatusCount]) -> (Vec<String>, Vec<(SnapshotMonth, Vec<usize>)>) {
    let statuses: Vec<String> = rows
        .iter()
        .map(|r| r.review_status.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut periods: Vec<(SnapshotMonth, Vec<usize>)> = Vec::new();
    for row in rows {
        let column = statuses
            .iter()
            .position(|s| *s == row.review_status)
            .unwrap_or_default();

        match periods.iter_mut().find(|(m, _)| *m == row.snapshot_month) {
            Some((_, counts)) => counts[column] += row.count,
            None => {
                let mut counts = vec![0; statuses.len()];
                counts[column] = row.count;
                periods.push((row.snapshot_month.clone(), counts));
            }
        }
    }
    periods.sort_by(|a, b| a.0.cmp(&b.0));

    (statuses, periods)
}

/// Generate the data quality section.
fn generate_data_quality_section(mismatches: &[DomainMismatch]) -> String {
    let mut section = String::new();

    section.push_str("## Data Quality\n\n");
    section.push_str(&format!(
        "{} fact row(s) disagree with the model dimension, which is treated as authoritative. \
         Rows in domains the model dimension does not list cannot be selected.\n\n",
        mismatches.len()
    ));

    for mismatch in mismatches {
        section.push_str(&format!("- {}\n", mismatch));
    }
    section.push('\n');

    section
}

/// Generate the raw snapshot preview.
fn generate_snapshot_section(preview: &[FactRow], total: usize) -> String {
    let mut section = String::new();

    section.push_str("## Raw Snapshot Data\n\n");

    if preview.is_empty() {
        section.push_str(EMPTY_VIEW);
        return section;
    }

    section.push_str(&format!("| {} |\n", FACT_COLUMNS.join(" | ")));
    section.push_str(&format!(
        "|{}\n",
        FACT_COLUMNS.iter().map(|_| ":---|").collect::<String>()
    ));

    for row in preview {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            row.snapshot_month,
            row.business_domain,
            row.model_id,
            row.review_status,
            if row.is_overdue() { "Y" } else { "N" },
            row.days_overdue.map(|d| d.to_string()).unwrap_or_default(),
            row.current_risk_tier,
            row.lead_validator_person_id.as_deref().unwrap_or(""),
        ));
    }
    section.push('\n');

    if total > preview.len() {
        section.push_str(&format!(
            "_Showing {} of {} rows. Use `--export` for the full snapshot._\n\n",
            preview.len(),
            total
        ));
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by govdash*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect::<String>()
        .replace(' ', "-")
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let width = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(width.max(1))
}

fn share(value: f64, total: f64) -> String {
    if total <= 0.0 {
        return "0%".to_string();
    }
    format!("{:.0}%", value / total * 100.0)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DashboardMetrics;
    use crate::filter::FilterContext;
    use crate::store::tests::fixture_store;
    use chrono::Utc;

    fn create_test_report(period: &str, domains: &[&str]) -> DashboardReport {
        let store = fixture_store();
        let filter = FilterContext::new(&store, period, domains).unwrap();
        let metrics = DashboardMetrics::compute(&store, &filter);
        let rows = crate::export::snapshot_rows(&store, &filter);

        DashboardReport {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                data_dir: "fixtures/data".to_string(),
                snapshot_month: filter.period().clone(),
                domains: filter.domains().iter().cloned().collect(),
                fact_rows_loaded: store.fact_row_count(),
                snapshot_rows: rows.len(),
                duration_seconds: 0.01,
            },
            metrics,
            data_quality: Vec::new(),
            snapshot_preview: rows.into_iter().take(2).cloned().collect(),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report("2025-03", &["Credit", "Fraud", "Forecasting"]);
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# Model Governance Dashboard"));
        assert!(markdown.contains("## How to Read This Dashboard"));
        assert!(markdown.contains("## Overdue Review Trend"));
        assert!(markdown.contains("## SLA Breach Buckets"));
        assert!(markdown.contains("| Alice Moreno | 2 |"));
        assert!(markdown.contains("| Fraud | 91 |"));
        assert!(markdown.contains("| Credit | 67.5 |"));
        // Reviews, open, overdue, overdue 90+.
        assert!(markdown.contains("| 5 | 3 | 3 | 2 |"));
        assert!(markdown.contains("Showing 2 of 5 rows"));
        assert!(!markdown.contains("## Data Quality"));
    }

    #[test]
    fn test_guide_can_be_omitted() {
        let report = create_test_report("2025-03", &["Credit"]);
        let options = ReportConfig {
            include_guide: false,
            ..ReportConfig::default()
        };
        let markdown = generate_markdown_report(&report, &options);
        assert!(!markdown.contains("How to Read"));
    }

    #[test]
    fn test_empty_selection_renders_placeholders() {
        let report = create_test_report("2025-01", &[]);
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert_eq!(markdown.matches(EMPTY_VIEW).count(), 7);
        assert!(markdown.contains("_none selected_"));
    }

    #[test]
    fn test_pivot_status_counts() {
        let report = create_test_report("2025-03", &["Credit", "Fraud", "Forecasting"]);
        let (statuses, periods) = pivot_status_counts(&report.metrics.open_vs_closed.rows);

        assert_eq!(statuses, vec!["Closed", "Open"]);
        let wide: Vec<(&str, Vec<usize>)> = periods
            .iter()
            .map(|(m, c)| (m.as_str(), c.clone()))
            .collect();
        assert_eq!(
            wide,
            vec![
                ("2025-01", vec![1, 3]),
                ("2025-02", vec![1, 4]),
                ("2025-03", vec![2, 3]),
            ]
        );
    }

    #[test]
    fn test_data_quality_section() {
        let mut report = create_test_report("2025-03", &["Credit"]);
        report.data_quality.push(DomainMismatch::UnknownDomain {
            snapshot_month: "2025-03".parse().unwrap(),
            model_id: "M404".to_string(),
            business_domain: "Treasury".to_string(),
        });

        let markdown = generate_markdown_report(&report, &ReportConfig::default());
        assert!(markdown.contains("## Data Quality"));
        assert!(markdown.contains("M404"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report("2025-03", &["Credit"]);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"snapshot_month\": \"2025-03\""));
        assert!(json.contains("\"risk_tier_distribution\""));
        assert!(json.contains("\"visualization\": \"donut\""));
    }

    #[test]
    fn test_helpers() {
        assert_eq!(anchor("Open vs Closed Reviews"), "open-vs-closed-reviews");
        assert_eq!(bar(10.0, 10.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(0.0, 10.0).chars().count(), 1);
        assert_eq!(share(1.0, 4.0), "25%");
        assert_eq!(format_number(27.5), "27.5");
        assert_eq!(format_number(91.0), "91");
    }
}
