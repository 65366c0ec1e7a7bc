use crate::handlers;
use crate::middleware::admin_gate;
use crate::refresher::Refresher;
use axum::Router as AxumRouter;
use axum::middleware;
use axum::routing::{any, get, post};
use secnex_core::server::ServerInfo;
use secnex_core::table::RouteTable;
use secnex_proxy::ProxyCore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Shared state for HTTP Dispatch (§4.7). The Route Table and the
/// Refresher each guard their own mutable state; this struct just holds
/// the handles every request needs.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub proxy: Arc<ProxyCore>,
    pub refresher: Arc<Refresher>,
    pub server: ServerInfo,
    pub admin_token: Option<String>,
}

/// The gateway's single HTTP listener: proxy dispatch, health, and the
/// admin refresh endpoint.
pub struct GatewayServer {
    state: AppState,
    port: u16,
}

impl GatewayServer {
    pub fn new(state: AppState, port: u16) -> Self {
        Self { state, port }
    }

    /// Bind the listener and serve until `shutdown` resolves (§4.11). The
    /// listener closes before this call returns, ahead of whatever the
    /// caller does next in the shutdown sequence (§5).
    pub async fn start(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let app = build_router(self.state);

        info!(%addr, "Starting HTTP dispatch");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        Ok(())
    }
}

/// Build the dispatch router (§4.7). New routes published into the Route
/// Table are reachable immediately through the catch-all — there is no
/// separate router-rebinding step to race against a request, since
/// dispatch always re-resolves against the current snapshot.
pub fn build_router(state: AppState) -> AxumRouter {
    let base = state.server.base_path.trim_end_matches('/');
    let refresh_path = format!("{base}/gateway/refresh");
    let refresh_route = AxumRouter::new()
        .route(&refresh_path, post(handlers::refresh::refresh))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_gate));

    AxumRouter::new()
        .route("/health", get(handlers::health::health_check))
        .route(&format!("{base}/health"), get(handlers::health::health_check))
        .merge(refresh_route)
        .route(&format!("{base}/{{*rest}}"), any(handlers::proxy::dispatch))
        .with_state(state)
}
