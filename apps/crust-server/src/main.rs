mod routes;
mod sessions;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crust::Crust;
use static_token_plugin::Service;
use tracing_subscriber::{EnvFilter, fmt};

use crate::sessions::MemorySessionStore;
use crate::settings::{LogFormat, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "crust-server",
    version,
    about = "Demo server behind the Crust authorization layer"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match settings.server.log_format {
        LogFormat::Text => fmt().with_env_filter(env_filter).init(),
        LogFormat::Json => fmt().json().with_env_filter(env_filter).init(),
    }
    tracing::info!(server = ?settings.server, crust = ?settings.crust, "Loaded configuration");

    let table = routes::table()?;
    let crust = Crust::builder(settings.crust)
        .verifier(Arc::new(Service::from_config(&settings.verifier)))
        .session_store(Arc::new(MemorySessionStore::new()))
        .routes(&table)
        .build()
        .context("invalid authorization configuration")?;
    let app = crust.apply(table.into_router());

    let listener = tokio::net::TcpListener::bind(settings.server.bind_addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind_addr))?;
    tracing::info!(addr = %settings.server.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
