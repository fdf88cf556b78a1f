//! Error types for loading and filtering governance data.

use crate::models::SnapshotMonth;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the fact store and filter construction.
///
/// Aggregations never fail; an empty result set is a valid output.
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// A source file could not be opened or read.
    #[error("Data unavailable: {}: {source}", path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fact table holds no rows, so there is no period to select.
    #[error("Data unavailable: {} contains no rows", path.display())]
    EmptyFactTable { path: PathBuf },

    /// A required column is missing or a value breaks the column contract.
    #[error("Schema mismatch in {}: {detail}", path.display())]
    SchemaMismatch { path: PathBuf, detail: String },

    /// The selected snapshot period is not present in the data.
    #[error("Invalid filter: unknown snapshot month '{period}'")]
    InvalidFilter {
        period: String,
        known: Vec<SnapshotMonth>,
    },
}

impl GovernanceError {
    /// Classify a csv error raised while reading `path`.
    ///
    /// I/O failures mean the source is unreadable; everything else is a
    /// value that does not fit the column contract.
    pub fn from_csv(path: &std::path::Path, err: csv::Error) -> Self {
        let position = err
            .position()
            .map(|p| format!("line {}: ", p.line()))
            .unwrap_or_default();

        match err.into_kind() {
            csv::ErrorKind::Io(source) => GovernanceError::DataUnavailable {
                path: path.to_path_buf(),
                source,
            },
            csv::ErrorKind::Deserialize { err, .. } => GovernanceError::SchemaMismatch {
                path: path.to_path_buf(),
                detail: format!("{}{}", position, err),
            },
            other => GovernanceError::SchemaMismatch {
                path: path.to_path_buf(),
                detail: format!("{}{:?}", position, other),
            },
        }
    }
}

/// Result type alias for store and filter operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;
