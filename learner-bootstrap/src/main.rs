use anyhow::{Context, Result};
use clap::Parser;
use learner_bootstrap::{BootstrapConfig, ConnectionBootstrap};
use learner_core::DbRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};

/// Check Cassandra connections for the learner keyspaces
#[derive(Parser)]
#[command(name = "learner-bootstrap")]
#[command(about = "Establish and verify Cassandra connections for the learner services")]
#[command(version)]
struct Cli {
    /// Properties file (defaults to CONFIG_PATH, then config/dbconfig.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keyspace to check; repeatable. Defaults to every registered keyspace
    #[arg(short, long)]
    keyspace: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match &cli.config {
        Some(path) => {
            let config = BootstrapConfig::load_from_file(path)?;
            config.validate()?;
            config
        }
        None => BootstrapConfig::load()?,
    };
    let config = Arc::new(config);
    let mode = config.connection_mode()?;
    info!("Loaded {} properties, connection mode {}", config.properties.len(), mode.as_str());

    let registry = DbRegistry::standard();
    let keyspaces = if cli.keyspace.is_empty() {
        registry.keyspaces()
    } else {
        cli.keyspace.clone()
    };

    let bootstrap = ConnectionBootstrap::new(config);
    let reports = bootstrap
        .ensure_all(&keyspaces)
        .await
        .context("Cassandra connection check failed")?;

    for report in &reports {
        if report.succeeded() {
            info!(
                "Keyspace {}: {}/{} endpoints connected ({:?})",
                report.keyspace,
                report.successes(),
                report.attempts.len(),
                report.source
            );
        } else {
            warn!("Keyspace {}: not connected ({:?})", report.keyspace, report.source);
        }
    }

    Ok(())
}
