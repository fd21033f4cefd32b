mod bootstrap;

use anyhow::Result;
use schemawatch_core::config::{AppConfig, LoadOptions};
use schemawatch_core::BuildInfo;

fn init_logging(config: &AppConfig) {
    use schemawatch_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations; any
    // credential failure here exits non-zero with no partial operation.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let build = BuildInfo::capture();
    tracing::info!(
        version = build.version,
        commit = build.commit,
        os_arch = build.os_arch,
        rustc = build.rustc_version,
        build_date = build.build_date,
        "schemawatch starting"
    );

    let app = bootstrap::bootstrap_with_config(config).await?;

    // A runner error here means the platform connection failed
    // unrecoverably; per-event failures never propagate this far.
    app.runner.start().await?;

    tracing::info!("schemawatch started");
    wait_for_shutdown().await?;
    tracing::info!("schemawatch stopping");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
