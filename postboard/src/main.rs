//! `postboard` binary: parses the CLI, connects the store and runs the chosen command.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Context;
use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use postboard::config::{AppConfig, Cli, Command};
use postboard::http::{router, AppState};
use postboard::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or_default();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    info!(
        bind = %config.bind,
        backend = config.database.backend_name(),
        max_connections = config.database.max_connections,
        min_connections = config.database.min_connections,
        connect_timeout = ?config.database.connect_timeout,
        command = ?command,
        "configuration loaded"
    );

    let store = Store::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    let outcome = match command {
        Command::Serve => run_server(&config, store.clone()).await,
        Command::Migrate => store
            .create_schema()
            .await
            .context("failed to create schema"),
        Command::Seed { undo: false } => store
            .seed_fixtures()
            .await
            .map(|_| ())
            .context("failed to seed fixture users"),
        Command::Seed { undo: true } => store
            .unseed_fixtures()
            .await
            .map(|_| ())
            .context("failed to remove fixture users"),
    };

    store.close().await.context("failed to close database")?;
    outcome
}

async fn run_server(config: &AppConfig, store: Store) -> anyhow::Result<()> {
    let app = router(AppState::new(store));
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "postboard listening");

    serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutting down gracefully");
        })
        .await
        .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
