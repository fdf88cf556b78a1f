//! Read-only fact store.
//!
//! Holds the monthly fact table together with the model and person
//! dimensions. Loaded once, never mutated, and safe to share behind an
//! `Arc` between any number of readers.

pub mod loader;

pub use loader::DataPaths;

use crate::error::{GovernanceError, Result};
use crate::filter::FilterContext;
use crate::models::{DomainMismatch, FactRow, ModelDim, PersonDim, SnapshotMonth};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which snapshot periods a row query spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodScope {
    /// Only the filter's selected period.
    Selected,
    /// Every period in the data (trend views).
    AllPeriods,
}

/// The loaded fact and dimension tables.
#[derive(Debug)]
pub struct FactStore {
    source: PathBuf,
    facts: Vec<FactRow>,
    periods: Vec<SnapshotMonth>,
    domains: Vec<String>,
    persons: HashMap<String, String>,
    mismatches: Vec<DomainMismatch>,
}

impl FactStore {
    /// Load all three tables from disk.
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let facts = loader::read_facts(&paths.fact)?;
        let models = loader::read_models(&paths.model)?;
        let persons = loader::read_persons(&paths.person)?;

        let store = Self::from_tables(&paths.fact, facts, models, persons)?;
        info!(
            "Loaded {} fact rows across {} snapshot(s), {} domain(s), {} person(s)",
            store.facts.len(),
            store.periods.len(),
            store.domains.len(),
            store.persons.len()
        );
        Ok(store)
    }

    /// Build a store from already-parsed tables.
    ///
    /// Every overdue row must carry a day count, otherwise the whole table
    /// is rejected with `SchemaMismatch`. The model dimension is
    /// authoritative for the domain enumeration; fact rows that disagree
    /// with it are recorded, not rewritten.
    pub fn from_tables(
        source: &Path,
        facts: Vec<FactRow>,
        models: Vec<ModelDim>,
        persons: Vec<PersonDim>,
    ) -> Result<Self> {
        check_overdue_days(source, &facts)?;

        let domains: BTreeSet<String> = models.iter().map(|m| m.business_domain.clone()).collect();

        let mut model_domains: HashMap<&str, &str> = HashMap::new();
        for model in &models {
            let existing = model_domains
                .entry(model.model_id.as_str())
                .or_insert(model.business_domain.as_str());
            if *existing != model.business_domain {
                warn!(
                    "Model {} listed under both '{}' and '{}' in the model dimension; using '{}'",
                    model.model_id, existing, model.business_domain, existing
                );
            }
        }

        let mut mismatches = Vec::new();
        for row in &facts {
            if !domains.contains(&row.business_domain) {
                mismatches.push(DomainMismatch::UnknownDomain {
                    snapshot_month: row.snapshot_month.clone(),
                    model_id: row.model_id.clone(),
                    business_domain: row.business_domain.clone(),
                });
            } else if let Some(dimension_domain) = model_domains.get(row.model_id.as_str()) {
                if *dimension_domain != row.business_domain {
                    mismatches.push(DomainMismatch::ModelDomainDisagrees {
                        snapshot_month: row.snapshot_month.clone(),
                        model_id: row.model_id.clone(),
                        fact_domain: row.business_domain.clone(),
                        dimension_domain: dimension_domain.to_string(),
                    });
                }
            }
        }

        for mismatch in &mismatches {
            warn!("Domain mismatch: {}", mismatch);
        }

        let periods: BTreeSet<SnapshotMonth> =
            facts.iter().map(|f| f.snapshot_month.clone()).collect();

        let persons = persons
            .into_iter()
            .map(|p| (p.person_id, p.person_name))
            .collect();

        Ok(Self {
            source: source.to_path_buf(),
            facts,
            periods: periods.into_iter().collect(),
            domains: domains.into_iter().collect(),
            persons,
            mismatches,
        })
    }

    /// Distinct snapshot periods, ascending.
    pub fn list_snapshot_periods(&self) -> &[SnapshotMonth] {
        &self.periods
    }

    /// Distinct business domains of the model dimension, ascending.
    pub fn list_business_domains(&self) -> &[String] {
        &self.domains
    }

    /// Most recent snapshot period, if any rows exist.
    pub fn latest_period(&self) -> Option<&SnapshotMonth> {
        self.periods.last()
    }

    /// Rows inside the filter's domains, limited to the selected period
    /// unless `scope` is `AllPeriods`. Source order is preserved.
    pub fn query<'a>(
        &'a self,
        filter: &'a FilterContext,
        scope: PeriodScope,
    ) -> impl Iterator<Item = &'a FactRow> + 'a {
        self.facts.iter().filter(move |row| {
            filter.contains_domain(&row.business_domain)
                && (scope == PeriodScope::AllPeriods || row.snapshot_month == *filter.period())
        })
    }

    /// Look up a person's display name.
    pub fn person_name(&self, person_id: &str) -> Option<&str> {
        self.persons.get(person_id).map(String::as_str)
    }

    /// Reconciliation findings between the fact table and the model dimension.
    pub fn domain_mismatches(&self) -> &[DomainMismatch] {
        &self.mismatches
    }

    /// Total fact rows across every period.
    pub fn fact_row_count(&self) -> usize {
        self.facts.len()
    }

    pub(crate) fn empty_error(&self) -> GovernanceError {
        GovernanceError::EmptyFactTable {
            path: self.source.clone(),
        }
    }
}

/// Reject overdue rows without `days_overdue`.
fn check_overdue_days(source: &Path, facts: &[FactRow]) -> Result<()> {
    // Header is line 1, so record i sits on line i + 2.
    match facts
        .iter()
        .position(|row| row.is_overdue() && row.days_overdue.is_none())
    {
        Some(i) => Err(GovernanceError::SchemaMismatch {
            path: source.to_path_buf(),
            detail: format!(
                "line {}: days_overdue is required when overdue_flag is Y",
                i + 2
            ),
        }),
        None => Ok(()),
    }
}
