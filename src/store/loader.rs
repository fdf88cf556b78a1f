//! CSV loading for the fact and dimension tables.
//!
//! Each table is read once with the csv crate, its header checked against
//! the expected column contract, and every record deserialized with serde.

use crate::error::{GovernanceError, Result};
use crate::models::{FactRow, ModelDim, PersonDim, FACT_COLUMNS, MODEL_COLUMNS, PERSON_COLUMNS};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locations of the three source tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub fact: PathBuf,
    pub model: PathBuf,
    pub person: PathBuf,
}

impl DataPaths {
    /// Resolve table file names against a data directory.
    pub fn in_dir(dir: &Path, data: &crate::config::DataConfig) -> Self {
        Self {
            fact: dir.join(&data.fact_file),
            model: dir.join(&data.model_file),
            person: dir.join(&data.person_file),
        }
    }
}

/// Read the fact table.
///
/// Cross-column rules (a day count on every overdue row) are enforced by
/// `FactStore::from_tables`.
pub fn read_facts(path: &Path) -> Result<Vec<FactRow>> {
    read_table(path, &FACT_COLUMNS)
}

/// Read the model dimension.
pub fn read_models(path: &Path) -> Result<Vec<ModelDim>> {
    read_table(path, &MODEL_COLUMNS)
}

/// Read the person dimension.
pub fn read_persons(path: &Path) -> Result<Vec<PersonDim>> {
    read_table(path, &PERSON_COLUMNS)
}

/// Read a headed CSV table, requiring every column in `required`.
///
/// Extra columns are ignored.
fn read_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|source| GovernanceError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| GovernanceError::from_csv(path, e))?
        .clone();

    let missing: Vec<&str> = required
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .copied()
        .collect();

    if !missing.is_empty() {
        return Err(GovernanceError::SchemaMismatch {
            path: path.to_path_buf(),
            detail: format!("missing column(s): {}", missing.join(", ")),
        });
    }

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.map_err(|e| GovernanceError::from_csv(path, e))?);
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
