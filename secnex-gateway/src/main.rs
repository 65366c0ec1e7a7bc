use clap::Parser;
use secnex_core::config::GatewayConfig;
use secnex_core::table::RouteTable;
use secnex_http::{AppState, GatewayServer, Refresher};
use secnex_proxy::ProxyCore;
use secnex_store::PgStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "secnex-gateway", version, about = "SecNex Gateway")]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overrides the configured `log_level`
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "SecNex Gateway exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = GatewayConfig::load(cli.config.as_ref().and_then(|p| p.to_str()))?;
    secnex_observability::logger::init(cli.log_level.as_deref().unwrap_or(&config.log_level));

    info!(version = env!("CARGO_PKG_VERSION"), "SecNex Gateway starting");

    let store = match PgStore::connect(&config.db.connection_url()).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to connect to the route-table store");
            std::process::exit(1);
        }
    };

    let server_info = store.load_server(&config.server).await?;
    info!(server = %server_info.name, base_path = %server_info.base_path, "Resolved gateway instance");

    let initial_routes = store.load_routes(&server_info.id).await?;
    info!(count = initial_routes.len(), "Loaded initial route snapshot");

    let table = Arc::new(RouteTable::with_routes(initial_routes));
    let proxy = Arc::new(ProxyCore::new(Duration::from_millis(config.upstream_timeout_ms))?);
    let refresher = Arc::new(Refresher::new(
        store.clone(),
        Arc::clone(&table),
        server_info.id.clone(),
    ));

    let ticker = Arc::clone(&refresher).spawn_ticker(Duration::from_secs(config.refresh_minutes * 60));

    let state = AppState {
        table,
        proxy,
        refresher,
        server: server_info.clone(),
        admin_token: config.admin.token.clone(),
    };

    let port = server_info.port;
    let listen_result = GatewayServer::new(state, port)
        .start(shutdown_signal())
        .await;

    // Stop the refresher before releasing the database connection (§5).
    ticker.abort();
    store.close().await;

    if let Err(e) = listen_result {
        error!(error = %e, "Failed to bind the HTTP listener");
        std::process::exit(1);
    }

    info!("SecNex Gateway stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM (§4.11).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
