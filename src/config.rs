//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.govdash.toml` files.

use crate::export::DEFAULT_EXPORT_FILE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".govdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Source table settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Snapshot export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl GeneralConfig {
    /// Log level for this run. `quiet` always wins over `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "governance_report.md".to_string()
}

/// Locations of the fact and dimension tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the CSV files.
    #[serde(default = "default_data_dir")]
    pub dir: String,

    /// Monthly fact table file name.
    #[serde(default = "default_fact_file")]
    pub fact_file: String,

    /// Model dimension file name.
    #[serde(default = "default_model_file")]
    pub model_file: String,

    /// Person dimension file name.
    #[serde(default = "default_person_file")]
    pub person_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            fact_file: default_fact_file(),
            model_file: default_model_file(),
            person_file: default_person_file(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_fact_file() -> String {
    "fact_model_review_backlog_monthly.csv".to_string()
}

fn default_model_file() -> String {
    "dim_model.csv".to_string()
}

fn default_person_file() -> String {
    "dim_person.csv".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the "how to read this dashboard" section.
    #[serde(default = "default_true")]
    pub include_guide: bool,

    /// Include the data quality section when mismatches exist.
    #[serde(default = "default_true")]
    pub include_data_quality: bool,

    /// Raw snapshot rows shown in the report (the export is never limited).
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_guide: true,
            include_data_quality: true,
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_preview_rows() -> usize {
    20
}

/// Snapshot export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// File name used when `--export` is given without a path.
    #[serde(default = "default_export_file")]
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_export_file(),
        }
    }
}

fn default_export_file() -> String {
    DEFAULT_EXPORT_FILE.to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.data_dir {
            self.data.dir = dir.display().to_string();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(rows) = args.preview_rows {
            self.report.preview_rows = rows;
        }

        if args.no_guide {
            self.report.include_guide = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
