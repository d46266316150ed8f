use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pooper_api::app::{router, AppState};
use pooper_api::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "pooper-api", version, about = "Multi-tenant pet care tracking API")]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Tenant allow-list YAML file (overrides TENANTS_FILE)
    #[arg(long)]
    tenants_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, API_SECRET_AUTH_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(path) = args.tenants_file {
        config.tenant.allow_list_path = path;
    }
    tracing::info!("Starting Pooper API in {:?} mode", config.environment);

    let state = AppState::new(config);

    if state.config.provisioning.on_startup {
        let allow_list = state.tenants.allow_list().await;
        tracing::info!("Provisioning {} allow-listed tenants", allow_list.tenants().len());
        state
            .database
            .warm_up(allow_list.tenants())
            .await
            .context("tenant provisioning failed at startup")?;
    }

    let bind_addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Pooper API listening on http://{}", bind_addr);

    let database = state.database.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close_all().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
