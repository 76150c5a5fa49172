/// gke-census - GKE node inventory
///
/// Walks every project visible to the active gcloud account, classifies each
/// GKE cluster as Standard or Autopilot and reports node totals per mode.
mod config;
mod gcloud;
mod inventory;
mod report;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{CensusConfig, OutputFormat, ProjectFormat, Strategy, DEFAULT_CONFIG_PATH};
use crate::gcloud::{GcloudClient, ProjectLister};
use crate::utils::command::{check_tool_installed, CommandRunner, ProcessRunner};

#[derive(Parser)]
#[command(name = "gke-census")]
#[command(about = "Count GKE Standard and Autopilot nodes across all GCP projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path [default: gke-census.yaml, if present]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// How cluster listings are acquired
    #[arg(long, value_enum, global = true)]
    strategy: Option<Strategy>,

    /// Output format requested from `gcloud projects list`
    #[arg(long, value_enum, global = true)]
    project_format: Option<ProjectFormat>,

    /// Report format
    #[arg(short, long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Seconds to wait for each gcloud call (0 disables the limit)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan all projects and print node totals (default)
    Scan,

    /// Generate example configuration file
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing on stderr so the report owns stdout
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gke_census={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        None | Some(Commands::Scan) => scan(&cli).await,
        Some(Commands::Init) => init_config(&cli).await,
    };

    if let Err(e) = result {
        error!("An error occurred: {:#}", e);
        std::process::exit(1);
    }
}

/// Load configuration and apply command-line overrides
fn resolve_config(cli: &Cli) -> Result<CensusConfig> {
    let mut config = CensusConfig::load(cli.config.as_deref())?;

    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    if let Some(format) = cli.project_format {
        config.project_format = format;
    }
    if let Some(output) = cli.format {
        config.output = output;
    }
    if let Some(secs) = cli.timeout {
        config.gcloud.timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

/// Make sure the configured gcloud answers `gcloud version` within the call limit
async fn ensure_gcloud(config: &CensusConfig) -> Result<String> {
    let binary = config.gcloud_binary();
    check_tool_installed(
        &binary,
        &["version"],
        "https://cloud.google.com/sdk/docs/install",
        config.command_timeout(),
    )
    .await
    .context("gcloud is required")?;
    Ok(binary)
}

/// Run the inventory and print the report
async fn scan(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let binary = ensure_gcloud(&config).await?;

    info!(
        "Scanning with {:?} cluster listing, {:?} project listing",
        config.strategy, config.project_format
    );

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new(config.command_timeout()));
    let gcloud = GcloudClient::new(binary, runner);
    let projects = ProjectLister::new(gcloud.clone(), config.project_format);
    let lister = inventory::lister_for(config.strategy, gcloud);

    let report = inventory::scan(&projects, lister.as_ref())
        .await
        .context("Failed to list GCP projects")?;

    let totals = &report.aggregate;
    info!(
        "Scanned {} projects ({} skipped with errors): {} Standard clusters, {} Autopilot clusters",
        totals.projects_scanned,
        totals.projects_failed,
        totals.standard_clusters,
        totals.autopilot_clusters
    );

    match config.output {
        OutputFormat::Text => print!("{}", report::render_text(&report)?),
        OutputFormat::Json => println!("{}", report::render_json(&report)?),
    }

    Ok(())
}

/// Initialize example configuration file
async fn init_config(cli: &Cli) -> Result<()> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if path.exists() {
        anyhow::bail!("Configuration file already exists: {}", path.display());
    }

    let yaml = serde_yaml::to_string(&CensusConfig::example())?;

    tokio::fs::write(&path, yaml)
        .await
        .context("Failed to write configuration file")?;

    info!("Example configuration created: {}", path.display());
    info!("");
    info!("Next steps:");
    info!("  1. Authenticate gcloud:");
    info!("     gcloud auth login");
    info!("  2. Run the scan:");
    info!("     gke-census scan");

    Ok(())
}
