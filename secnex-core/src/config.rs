use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the gateway (§4.8).
///
/// Layering: compiled-in defaults → optional YAML file → `GATEWAY_`-prefixed
/// environment variables, the last source wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Name used to look up this instance's row in the `servers` table.
    #[serde(default = "default_server")]
    pub server: String,

    /// Database connection settings.
    #[serde(default)]
    pub db: DbConfig,

    /// How often the background refresher reloads the route table, in minutes.
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u64,

    /// Upstream request timeout, in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,

    /// Log level (`error`, `warn`, `info`, `debug`, `trace`), overridable by
    /// `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Admin gate configuration for `{base}/gateway/refresh` (§9).
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default = "default_db_password")]
    pub password: String,
    #[serde(default = "default_db_database")]
    pub database: String,
    #[serde(default)]
    pub sslmode: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: default_db_password(),
            database: default_db_database(),
            sslmode: false,
        }
    }
}

impl DbConfig {
    /// Render a `postgres://` connection URL suitable for `sqlx::PgPool`.
    pub fn connection_url(&self) -> String {
        let mode = if self.sslmode { "require" } else { "disable" };
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.database, mode
        )
    }
}

/// Admin gate for the refresh endpoint. When `token` is `None`, the gate is
/// presence-only (any non-empty `Authorization` header passes), matching the
/// source's vestigial check. When set, the header must be `Bearer <token>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    pub token: Option<String>,
}

impl GatewayConfig {
    /// Load configuration from an optional YAML file plus environment
    /// variables (`GATEWAY_DB__HOST`, `GATEWAY_SERVER`, ...).
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();

        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        } else {
            for default_path in &["gateway.yaml", "/etc/secnex/gateway.yaml"] {
                if std::path::Path::new(default_path).exists() {
                    figment = figment.merge(Yaml::file(default_path));
                    break;
                }
            }
        }

        figment = figment.merge(Env::prefixed("GATEWAY_").split("__"));

        let config: Self = figment.extract()?;
        Ok(config)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            db: DbConfig::default(),
            refresh_minutes: default_refresh_minutes(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
            log_level: default_log_level(),
            admin: AdminConfig::default(),
        }
    }
}

fn default_server() -> String {
    "SGW01".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "postgres".to_string()
}

fn default_db_database() -> String {
    "secnex_gateway".to_string()
}

fn default_refresh_minutes() -> u64 {
    5
}

fn default_upstream_timeout_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_constants() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.server, "SGW01");
        assert_eq!(cfg.db.host, "localhost");
        assert_eq!(cfg.db.port, 5432);
        assert_eq!(cfg.db.database, "secnex_gateway");
        assert_eq!(cfg.refresh_minutes, 5);
    }

    #[test]
    fn connection_url_reflects_sslmode() {
        let mut cfg = DbConfig::default();
        assert!(cfg.connection_url().ends_with("sslmode=disable"));
        cfg.sslmode = true;
        assert!(cfg.connection_url().ends_with("sslmode=require"));
    }
}
