//! flashd-replay - replay scripted hotplug scenarios against the device
//! registry.
//!
//! Every notification is logged as it happens. Once all steps ran and all
//! pending removals settled, a summary is printed to stdout.

#![deny(clippy::unwrap_used)]

mod error;
mod runner;
mod scenario;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flashd_registry::RegistryConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::scenario::{Format, Scenario};

#[derive(Parser, Debug)]
#[command(name = "flashd-replay")]
#[command(about = "Replay a hotplug scenario against the flashd device registry")]
#[command(version)]
struct Cli {
    /// Scenario file (YAML or JSON)
    scenario: PathBuf,

    /// Scenario format; guessed from the extension when omitted
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Registry configuration file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "flashd=debug"
    } else {
        "flashd=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let scenario = Scenario::load(&cli.scenario, cli.format)
        .with_context(|| format!("failed to load scenario {}", cli.scenario.display()))?;
    let config = match &cli.config {
        Some(path) => RegistryConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RegistryConfig::default(),
    };

    info!(
        devices = scenario.devices.len(),
        steps = scenario.steps.len(),
        "replaying scenario"
    );
    let summary = runner::run(&scenario, config)
        .await
        .context("scenario run failed")?;
    println!("{summary}");
    Ok(())
}
