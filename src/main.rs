use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dkan_harvester::{
    DkanClient, HarvestPipeline, HarvesterConfig, HarvesterInfo, HttpContentSource,
    JsonLinesSink, PackageNormalizer, StaticLicenseRegistry,
};

/// Harvest a remote DKAN catalog into CKAN package metadata.
///
/// Canonical packages are written to stdout, one JSON document per line.
#[derive(Parser, Debug)]
#[command(name = "dkan-harvest", version)]
struct Cli {
    /// Base URL of the remote DKAN site, e.g. https://data.example.gov
    #[arg(required_unless_present = "info")]
    base_url: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON license list (overrides `license_file` from the config)
    #[arg(long)]
    licenses: Option<PathBuf>,

    /// Packages processed at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the harvester descriptor as JSON and exit
    #[arg(long)]
    info: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Harvest failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    if cli.info {
        println!("{}", serde_json::to_string_pretty(&HarvesterInfo::dkan())?);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(base_url) = cli.base_url else {
        return Err("a base URL is required".into());
    };

    let mut config = match &cli.config {
        Some(path) => HarvesterConfig::load(path)?,
        None => HarvesterConfig::default(),
    };
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }

    let licenses = match &cli.licenses {
        Some(path) => StaticLicenseRegistry::load(path)?,
        None => config.license_registry()?,
    };

    let pipeline = HarvestPipeline::new(
        DkanClient::new(HttpContentSource::new(&config)?),
        PackageNormalizer::new(Arc::new(licenses)),
        JsonLinesSink::new(std::io::stdout()),
    )
    .with_config(&config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight packages");
            on_interrupt.cancel();
        }
    });

    let report = match pipeline.run_source_cancellable(&base_url, cancel).await {
        Ok(report) => report,
        Err(e) => {
            error!(source = %base_url, error = %e, "Source harvest aborted");
            return Ok(ExitCode::FAILURE);
        }
    };

    info!(
        source = %report.source,
        enumerated = report.enumerated,
        imported = report.imported.len(),
        failed = report.failures.len(),
        skipped = report.skipped.len(),
        "Harvest finished"
    );

    Ok(ExitCode::SUCCESS)
}
