mod bootstrap;
mod callback;
mod health;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use fetchbot_core::config::{AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "fetchbot-server",
    about = "Slack bot server: message-stream listener plus interaction callback endpoint"
)]
struct Args {
    /// Listen port for the interaction callback endpoint.
    #[arg(long)]
    port: Option<u16>,
    /// Request timeout in seconds for outbound Slack API calls.
    #[arg(long)]
    timeout: Option<u64>,
    /// Path to the TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging(config: &AppConfig) {
    use fetchbot_core::config::LogFormat::*;
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
    let args = Args::parse();

    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions {
        config_path: args.config,
        overrides: ConfigOverrides {
            callback_port: args.port,
            request_timeout_secs: args.timeout,
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    })?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(&app.config.server.bind_address, app.config.server.health_check_port).await?;
    callback::spawn(
        &app.config.server.bind_address,
        app.config.server.callback_port,
        app.resolver.clone(),
    )
    .await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let listener = app.listener;
    let listener_task = tokio::spawn(async move { listener.run(shutdown_rx).await });

    tracing::info!(
        event_name = "system.server.started",
        bot_user = %app.identity.name,
        callback_port = app.config.server.callback_port,
        "fetchbot server started"
    );

    wait_for_shutdown().await?;
    tracing::info!(event_name = "system.server.stopping", "fetchbot server stopping");

    let _ = shutdown_tx.send(true);
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, listener_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(error))) => {
            tracing::warn!(error = %error, "listener stopped with an error during shutdown");
        }
        Ok(Err(join_error)) => {
            tracing::warn!(error = %join_error, "listener task did not join cleanly");
        }
        Err(_) => {
            tracing::warn!(
                event_name = "system.server.shutdown_timeout",
                grace_secs = app.config.server.graceful_shutdown_secs,
                "listener did not stop within the grace period"
            );
        }
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
