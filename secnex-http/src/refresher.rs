//! The Refresher (§4.6): ticks on an interval, and is also triggered
//! on-demand by the admin endpoint. At most one load is in flight at a
//! time, enforced by the mutex guarding the load-and-swap sequence.

use secnex_core::error::GatewayError;
use secnex_core::table::RouteTable;
use secnex_observability::log_refresh_cycle;
use secnex_store::PgStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time;
use tracing::error;

pub struct Refresher {
    store: PgStore,
    table: Arc<RouteTable>,
    server_id: String,
    guard: Mutex<()>,
}

impl Refresher {
    pub fn new(store: PgStore, table: Arc<RouteTable>, server_id: String) -> Self {
        Self {
            store,
            table,
            server_id,
            guard: Mutex::new(()),
        }
    }

    /// Idle → Loading → (PublishOK | PublishFailed) → Idle. On failure the
    /// existing snapshot is retained.
    pub async fn refresh_once(&self) -> Result<usize, GatewayError> {
        let _permit = self.guard.lock().await;
        let start = Instant::now();
        match self.store.load_routes(&self.server_id).await {
            Ok(routes) => {
                let count = routes.len();
                self.table.set(routes);
                log_refresh_cycle("ok", count, start.elapsed().as_secs_f64() * 1000.0);
                Ok(count)
            }
            Err(e) => {
                log_refresh_cycle(
                    "failed",
                    self.table.len(),
                    start.elapsed().as_secs_f64() * 1000.0,
                );
                error!(error = %e, "Route table refresh failed; keeping the existing snapshot");
                Err(GatewayError::Store(e.to_string()))
            }
        }
    }

    /// Spawn the periodic ticker. The first tick is consumed immediately so
    /// the interval is measured from startup, not from the initial load
    /// the caller already performed. The returned handle is aborted by the
    /// caller during shutdown (§4.11, §5).
    pub fn spawn_ticker(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let _ = self.refresh_once().await;
            }
        })
    }
}
