//! Snapshot export: the unaggregated rows behind the current selection.

use crate::filter::FilterContext;
use crate::models::{FactRow, FACT_COLUMNS};
use crate::store::{FactStore, PeriodScope};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Default file name for a snapshot download.
pub const DEFAULT_EXPORT_FILE: &str = "model_governance_snapshot.csv";

/// Every fact row in the selected period and domains, in source order.
pub fn snapshot_rows<'a>(store: &'a FactStore, filter: &'a FilterContext) -> Vec<&'a FactRow> {
    store.query(filter, PeriodScope::Selected).collect()
}

/// Write rows as UTF-8 CSV with the fact-source header.
///
/// The header is written even when there are no rows.
pub fn write_csv<W: Write>(rows: &[&FactRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer
        .write_record(FACT_COLUMNS)
        .context("Failed to write export header")?;

    for row in rows {
        csv_writer
            .serialize(row)
            .with_context(|| format!("Failed to write export row for model {}", row.model_id))?;
    }

    csv_writer.flush().context("Failed to flush export")?;
    Ok(())
}

/// Write the snapshot export to `path`.
pub fn write_csv_file(rows: &[&FactRow], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    write_csv(rows, std::io::BufWriter::new(file))?;

    info!("Exported {} row(s) to {}", rows.len(), path.display());
    Ok(())
}
