use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod app;
mod http;
mod ws;

/// Real-time group chat server.
#[derive(Debug, Parser)]
#[command(name = "parley-gateway", version)]
struct Cli {
    /// Path to parley.toml (overrides PARLEY_CONFIG).
    #[arg(short, long)]
    config: Option<String>,

    /// Address to bind, e.g. 0.0.0.0.
    #[arg(long)]
    bind: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "parley_gateway=info,parley_hub=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > PARLEY_CONFIG > ./parley.toml, then PARLEY_* env
    let mut config =
        parley_core::config::ParleyConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
            tracing::warn!(code = e.code(), "Config load failed ({}), using defaults", e);
            parley_core::config::ParleyConfig::default()
        });
    if let Some(bind) = cli.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let addr: SocketAddr = config.listen_addr().parse()?;
    let mode = config.gateway.mode;

    let state = Arc::new(app::AppState::new(config));
    let router = app::build_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        version = app::VERSION,
        git_sha = app::GIT_SHA,
        mode = mode.as_str(),
        "Parley gateway listening on http://{}",
        addr
    );

    let state_for_shutdown = Arc::clone(&state);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!(
                clients = state_for_shutdown.hub.connection_count(),
                "shutdown requested, closing WS connections"
            );
            state_for_shutdown.begin_shutdown();
        })
        .await?;

    info!("Parley gateway stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
