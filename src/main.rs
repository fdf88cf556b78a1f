//! govdash - Model Governance Dashboard
//!
//! A CLI tool that loads monthly model-review backlog snapshots and
//! computes the governance views: overdue trend, open vs closed reviews,
//! median days overdue, SLA breach buckets, validator backlog and risk
//! tier distribution.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (data unavailable, schema mismatch, invalid filter, I/O)

mod analysis;
mod cli;
mod config;
mod error;
mod export;
mod filter;
mod models;
mod report;
mod session;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, DomainSelection, OutputFormat};
use config::Config;
use error::GovernanceError;
use filter::FilterContext;
use models::{DashboardReport, ReportMetadata};
use session::Session;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use store::{DataPaths, FactStore};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so `[general] verbose` can set the level.
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.general.log_level(args.quiet));

    info!("govdash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run_dashboard(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);

            if let Some(GovernanceError::InvalidFilter { known, .. }) =
                e.downcast_ref::<GovernanceError>()
            {
                let months: Vec<&str> = known.iter().map(|m| m.as_str()).collect();
                eprintln!("   Known snapshot months: {}", months.join(", "));
            }
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .govdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", config::CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to point at your data directory and tune the report.");
    Ok(())
}

/// Initialize logging at the given level.
///
/// `GOVDASH_LOG` takes precedence over -v/-q and the config file when set.
fn init_logging(level: tracing::Level) {
    let env_filter = EnvFilter::try_from_env("GOVDASH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run one full dashboard pass. Returns the exit code.
fn run_dashboard(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Load the tables
    let data_dir = PathBuf::from(&config.data.dir);
    let paths = DataPaths::in_dir(&data_dir, &config.data);
    println!("📥 Loading governance data from {}", data_dir.display());

    let store = Arc::new(FactStore::load(&paths)?);

    if args.list {
        return handle_list(&store);
    }

    // Step 2: Build the filter context
    let filter = build_filter(&store, args)?;

    // Step 3: Compute every view against it
    println!(
        "🔬 Computing metrics for {} ({} domain(s))...",
        filter.period(),
        filter.domains().len()
    );
    let session = Session::open(Arc::clone(&store), filter);

    if session.filter().is_empty() {
        warn!("No business domains selected; every view will be empty");
    } else if session.metrics().is_empty() {
        info!("No rows match the current selection");
    }

    // Step 4: Build and write the report
    let preview = session
        .snapshot_rows()
        .into_iter()
        .take(config.report.preview_rows)
        .cloned()
        .collect();

    let report = DashboardReport {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            data_dir: data_dir.display().to_string(),
            snapshot_month: session.filter().period().clone(),
            domains: session.filter().domains().iter().cloned().collect(),
            fact_rows_loaded: store.fact_row_count(),
            snapshot_rows: session.snapshot_len(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        metrics: session.metrics().clone(),
        data_quality: store.domain_mismatches().to_vec(),
        snapshot_preview: preview,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Step 5: Optional snapshot export
    if let Some(ref target) = args.export {
        let export_path = target
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.export.file_name));
        export::write_csv_file(&session.snapshot_rows(), &export_path)?;
        println!(
            "💾 Exported {} snapshot row(s) to {}",
            session.snapshot_len(),
            export_path.display()
        );
    }

    // Print summary
    let metrics = session.metrics();
    println!("\n📊 Snapshot {}:", session.filter().period());
    println!("   Reviews: {}", metrics.reviews_in_period());
    println!("   Open: {}", metrics.open_in_period());
    println!("   Overdue: {}", metrics.overdue_in_period());
    if !store.domain_mismatches().is_empty() {
        println!(
            "   ⚠️  {} domain mismatch(es) between fact and model tables",
            store.domain_mismatches().len()
        );
    }
    println!(
        "\n✅ Report saved to: {} ({:.2}s)",
        output_path.display(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(0)
}

/// Handle --list: print the selectable values and exit.
fn handle_list(store: &FactStore) -> Result<i32> {
    println!("\nSnapshot months:");
    for period in store.list_snapshot_periods() {
        println!("   {}", period);
    }

    println!("\nBusiness domains:");
    for domain in store.list_business_domains() {
        println!("   {}", domain);
    }

    Ok(0)
}

/// Build the filter context from CLI selections, falling back to the
/// most recent snapshot and every domain.
fn build_filter(store: &FactStore, args: &Args) -> Result<FilterContext, GovernanceError> {
    let selection = args.domain_selection();

    let period = match args.snapshot {
        Some(ref period) => period.clone(),
        None if selection == DomainSelection::All => return FilterContext::defaults(store),
        None => store
            .latest_period()
            .map(|p| p.as_str().to_string())
            .ok_or_else(|| store.empty_error())?,
    };

    match selection {
        DomainSelection::All => FilterContext::new(store, &period, store.list_business_domains()),
        DomainSelection::Only(domains) => FilterContext::new(store, &period, domains),
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems go to stderr directly.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}", config::CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
