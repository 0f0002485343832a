//! snippetbox server

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use snippetbox::{config::SnippetboxConfig, observability, routes::routes, state::AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "snippetbox")]
#[command(version)]
#[command(about = "Publish and browse short text snippets", long_about = None)]
struct Cli {
    /// HTTP network address
    #[arg(long, env = "SNIPPETBOX_ADDR")]
    addr: Option<String>,

    /// SQLite data source name
    #[arg(long, env = "SNIPPETBOX_DSN")]
    dsn: Option<String>,

    /// Configuration file (defaults to ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init()?;

    let mut config = SnippetboxConfig::load(cli.config.as_deref())?;
    if let Some(addr) = cli.addr {
        config.server.addr = addr;
    }
    if let Some(dsn) = cli.dsn {
        config.database.url = dsn;
    }

    let addr = config.server.addr.clone();
    let cleanup_every = Duration::from_secs(config.session.cleanup_interval_secs.max(1));

    let state = AppState::connect(config).await?;
    let cleanup = state.sessions().spawn_cleanup(cleanup_every);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "starting server");

    axum::serve(
        listener,
        routes(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cleanup.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
