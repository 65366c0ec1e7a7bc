//! The Store Adapter (§4.1): a read-only view over the relational store,
//! assembling `Route`s from a route row, its firewall row, and three
//! policy lists.

use secnex_core::route::Route;
use secnex_core::server::ServerInfo;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

const ACTION_ALLOW: &str = "ALLOW";
const ACTION_BLOCK: &str = "BLOCK";

#[derive(FromRow)]
struct RouteRow {
    id: String,
    path: String,
    url: String,
    firewall_id: String,
    forward_sub_path: bool,
}

#[derive(FromRow)]
struct FirewallRow {
    allow_all: bool,
    require_auth: bool,
}

/// Read-only adapter over the gateway's PostgreSQL configuration store.
/// Cloning shares the same underlying connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(connection_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to the route-table store");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(connection_url)
            .await?;
        Ok(Self { pool })
    }

    /// A pool that defers its first real connection attempt, for wiring up
    /// a `Refresher` in tests that never actually trigger a reload.
    pub fn connect_lazy(connection_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new().connect_lazy(connection_url)?;
        Ok(Self { pool })
    }

    /// Release pooled connections on shutdown (§5 resource lifecycle).
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Resolve this gateway instance's own row by name (§4.1).
    pub async fn load_server(&self, name: &str) -> anyhow::Result<ServerInfo> {
        let row: (String, String, i32, String) = sqlx::query_as(
            "SELECT id, name, port, base_path FROM servers WHERE name = $1 AND deleted_at IS NULL LIMIT 1",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(ServerInfo {
            id: row.0,
            name: row.1,
            port: row.2 as u16,
            base_path: row.3,
        })
    }

    /// Load the full, normalized route set for `server_id` (§4.1).
    pub async fn load_routes(&self, server_id: &str) -> anyhow::Result<Vec<Route>> {
        let rows: Vec<RouteRow> = sqlx::query_as(
            "SELECT id, path, url, firewall_id, forward_sub_path FROM routes WHERE deleted_at IS NULL AND server_id = $1",
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        let mut routes = Vec::with_capacity(rows.len());
        for row in rows {
            let firewall: FirewallRow = sqlx::query_as(
                "SELECT allow_all, require_auth FROM firewalls WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(&row.firewall_id)
            .fetch_one(&self.pool)
            .await?;

            let allowed_methods = self
                .list_methods(&row.firewall_id, &row.id, ACTION_ALLOW)
                .await?;
            let allowed_ips = self
                .list_ips(&row.firewall_id, &row.id, ACTION_ALLOW)
                .await?;
            let blocked_ips = self
                .list_ips(&row.firewall_id, &row.id, ACTION_BLOCK)
                .await?;
            let allowed_user_agents = self
                .list_user_agents(&row.firewall_id, &row.id, ACTION_ALLOW)
                .await?;
            let rejected_user_agents = self
                .list_user_agents(&row.firewall_id, &row.id, ACTION_BLOCK)
                .await?;

            routes.push(Route {
                path: row.path,
                url: row.url,
                allowed_methods,
                allowed_ips,
                blocked_ips,
                allowed_user_agents,
                rejected_user_agents,
                default_allowed: firewall.allow_all,
                required_auth: firewall.require_auth,
                forward_sub_path: row.forward_sub_path,
            });
        }

        info!(count = routes.len(), "Loaded routes from the store");
        Ok(routes)
    }

    async fn list_methods(
        &self,
        firewall_id: &str,
        route_id: &str,
        action: &str,
    ) -> anyhow::Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT method FROM methods WHERE firewall_id = $1 AND route_id = $2 AND action = $3 AND deleted_at IS NULL",
        )
        .bind(firewall_id)
        .bind(route_id)
        .bind(action)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(m,)| m).collect())
    }

    async fn list_ips(
        &self,
        firewall_id: &str,
        route_id: &str,
        action: &str,
    ) -> anyhow::Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT ip FROM ips WHERE firewall_id = $1 AND route_id = $2 AND action = $3 AND deleted_at IS NULL",
        )
        .bind(firewall_id)
        .bind(route_id)
        .bind(action)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(ip,)| ip).collect())
    }

    async fn list_user_agents(
        &self,
        firewall_id: &str,
        route_id: &str,
        action: &str,
    ) -> anyhow::Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT user_agent FROM useragents WHERE firewall_id = $1 AND route_id = $2 AND action = $3 AND deleted_at IS NULL",
        )
        .bind(firewall_id)
        .bind(route_id)
        .bind(action)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(ua,)| ua).collect())
    }
}
