//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// govdash - model governance backlog metrics
///
/// Computes overdue trends, status splits, SLA breach buckets, validator
/// backlog and risk tier mix from monthly review snapshots, and writes
/// them as a Markdown or JSON report.
///
/// Examples:
///   govdash --data-dir ./data
///   govdash --snapshot 2025-03 --domains Credit,Fraud
///   govdash --format json --output metrics.json
///   govdash --export snapshot.csv
///   govdash --list
///   govdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding the fact and dimension CSV files
    ///
    /// Defaults to the config value, or ./data.
    #[arg(long, value_name = "DIR", env = "GOVDASH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Snapshot month to report on (e.g. 2025-03)
    ///
    /// Defaults to the most recent snapshot in the data.
    #[arg(short, long, value_name = "MONTH")]
    pub snapshot: Option<String>,

    /// Business domains to include (comma-separated)
    ///
    /// Defaults to every domain in the model dimension. Unknown names are ignored.
    #[arg(
        short,
        long,
        value_name = "DOMAINS",
        value_delimiter = ',',
        conflicts_with = "no_domains"
    )]
    pub domains: Option<Vec<String>>,

    /// Select no business domains (every view comes out empty)
    #[arg(long)]
    pub no_domains: bool,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Also write the raw snapshot rows as CSV
    ///
    /// Uses the configured export file name when no path is given.
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,

    /// Number of raw snapshot rows to show in the report
    #[arg(long, value_name = "COUNT")]
    pub preview_rows: Option<usize>,

    /// Leave the reading guide out of the report
    #[arg(long)]
    pub no_guide: bool,

    /// List known snapshot months and business domains, then exit
    #[arg(long)]
    pub list: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .govdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .govdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Domain selection requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainSelection {
    /// Every known domain.
    All,
    /// Exactly these names (possibly none).
    Only(Vec<String>),
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref snapshot) = self.snapshot {
            if snapshot.trim().is_empty() {
                return Err("Snapshot month must not be empty".to_string());
            }
        }

        // Validate data directory if provided
        if let Some(ref dir) = self.data_dir {
            if !dir.exists() {
                return Err(format!("Data directory does not exist: {}", dir.display()));
            }
            if !dir.is_dir() {
                return Err(format!("Data path is not a directory: {}", dir.display()));
            }
        }

        Ok(())
    }

    /// Returns the domain selection implied by --domains / --no-domains.
    pub fn domain_selection(&self) -> DomainSelection {
        if self.no_domains {
            return DomainSelection::Only(Vec::new());
        }

        match self.domains {
            Some(ref domains) => DomainSelection::Only(
                domains
                    .iter()
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .collect(),
            ),
            None => DomainSelection::All,
        }
    }
}
