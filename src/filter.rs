//! Filter context: the snapshot period and business domains a dashboard
//! pass is computed for.

use crate::error::{GovernanceError, Result};
use crate::models::SnapshotMonth;
use crate::store::FactStore;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// An immutable, validated selection of one period and a set of domains.
///
/// Built once per rendering pass and shared by every aggregation in that
/// pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterContext {
    period: SnapshotMonth,
    domains: BTreeSet<String>,
}

impl FilterContext {
    /// Validate a selection against the store.
    ///
    /// The period must be a known snapshot. Requested domains the model
    /// dimension does not list are dropped; an empty domain set is valid
    /// and selects nothing.
    pub fn new<I, S>(store: &FactStore, period: &str, domains: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let known = store.list_snapshot_periods();
        let period = known
            .iter()
            .find(|p| p.as_str() == period.trim())
            .cloned()
            .ok_or_else(|| GovernanceError::InvalidFilter {
                period: period.to_string(),
                known: known.to_vec(),
            })?;

        let known_domains = store.list_business_domains();
        let mut selected = BTreeSet::new();
        for domain in domains {
            let domain = domain.as_ref().trim();
            if known_domains.iter().any(|d| d == domain) {
                selected.insert(domain.to_string());
            } else {
                debug!("Ignoring unknown business domain '{}'", domain);
            }
        }

        debug!(
            "Filter: snapshot {} with {} domain(s)",
            period,
            selected.len()
        );

        Ok(Self {
            period,
            domains: selected,
        })
    }

    /// The most recent snapshot with every known domain selected.
    pub fn defaults(store: &FactStore) -> Result<Self> {
        let period = store.latest_period().ok_or_else(|| store.empty_error())?;
        Self::new(store, period.as_str(), store.list_business_domains())
    }

    pub fn period(&self) -> &SnapshotMonth {
        &self.period
    }

    pub fn domains(&self) -> &BTreeSet<String> {
        &self.domains
    }

    pub fn contains_domain(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    /// True when no domain is selected, so every view is empty.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
