//! Dashboard session state.
//!
//! A session pairs a shared, read-only fact store with one filter context
//! and every view computed from it. Sessions are per user; only the store
//! is shared.

use crate::analysis::DashboardMetrics;
use crate::error::Result;
use crate::export;
use crate::filter::FilterContext;
use crate::models::FactRow;
use crate::store::FactStore;
use std::sync::Arc;
use tracing::info;

/// Everything derived from one filter context.
#[derive(Debug, Clone)]
struct View {
    filter: FilterContext,
    metrics: DashboardMetrics,
    snapshot_len: usize,
}

impl View {
    fn compute(store: &FactStore, filter: FilterContext) -> Self {
        let metrics = DashboardMetrics::compute(store, &filter);
        let snapshot_len = export::snapshot_rows(store, &filter).len();
        Self {
            filter,
            metrics,
            snapshot_len,
        }
    }
}

/// One user's dashboard.
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<FactStore>,
    view: View,
}

impl Session {
    /// Start a session with an already-validated filter.
    pub fn open(store: Arc<FactStore>, filter: FilterContext) -> Self {
        let view = View::compute(&store, filter);
        Self { store, view }
    }

    /// Replace the selection and recompute every view.
    ///
    /// On error the previous selection and its views are kept.
    pub fn apply_filter<I, S>(&mut self, period: &str, domains: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filter = FilterContext::new(&self.store, period, domains)?;
        self.view = View::compute(&self.store, filter);

        info!(
            "Selection changed to {} ({} domain(s))",
            self.view.filter.period(),
            self.view.filter.domains().len()
        );
        Ok(())
    }

    pub fn filter(&self) -> &FilterContext {
        &self.view.filter
    }

    pub fn metrics(&self) -> &DashboardMetrics {
        &self.view.metrics
    }

    /// Raw rows of the current selection, in source order.
    pub fn snapshot_rows(&self) -> Vec<&FactRow> {
        export::snapshot_rows(&self.store, &self.view.filter)
    }

    /// Number of raw rows in the current selection.
    pub fn snapshot_len(&self) -> usize {
        self.view.snapshot_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GovernanceError;
    use crate::store::tests::fixture_store;

    fn open_defaults(store: Arc<FactStore>) -> Session {
        let filter = FilterContext::defaults(&store).unwrap();
        Session::open(store, filter)
    }

    fn session() -> Session {
        open_defaults(Arc::new(fixture_store()))
    }

    #[test]
    fn test_defaults() {
        let session = session();
        assert_eq!(session.filter().period().as_str(), "2025-03");
        assert_eq!(session.snapshot_len(), 5);
        assert_eq!(session.snapshot_rows().len(), 5);
        assert_eq!(session.metrics().reviews_in_period(), 5);
    }

    #[test]
    fn test_apply_filter_recomputes_every_view() {
        let mut session = session();
        session.apply_filter("2025-01", ["Credit"]).unwrap();

        assert_eq!(session.filter().period().as_str(), "2025-01");
        assert_eq!(session.snapshot_len(), 2);

        let metrics = session.metrics();
        assert_eq!(metrics.reviews_in_period(), 2);
        assert_eq!(metrics.overdue_in_period(), 2);
        assert_eq!(metrics.open_in_period(), 2);
        assert_eq!(metrics.median_days_overdue.rows[0].median_days_overdue, 27.5);
        // Trend still spans all periods for Credit.
        assert_eq!(metrics.overdue_trend.len(), 3);
    }

    #[test]
    fn test_failed_filter_keeps_previous_state() {
        let mut session = session();
        let before = session.metrics().clone();

        let err = session.apply_filter("1999-01", ["Credit"]).unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidFilter { .. }));

        assert_eq!(session.filter().period().as_str(), "2025-03");
        assert_eq!(
            session.metrics().reviews_in_period(),
            before.reviews_in_period()
        );
        assert_eq!(session.snapshot_len(), 5);
    }

    #[test]
    fn test_sessions_share_one_store() {
        let store = Arc::new(fixture_store());
        let mut a = open_defaults(Arc::clone(&store));
        let b = open_defaults(Arc::clone(&store));

        a.apply_filter("2025-02", ["Fraud"]).unwrap();

        assert_eq!(a.filter().period().as_str(), "2025-02");
        assert_eq!(b.filter().period().as_str(), "2025-03");
        assert_eq!(Arc::strong_count(&store), 3);
    }

    #[test]
    fn test_empty_selection() {
        let mut session = session();
        session.apply_filter("2025-02", Vec::<String>::new()).unwrap();

        assert!(session.metrics().is_empty());
        assert!(session.snapshot_rows().is_empty());
    }
}
