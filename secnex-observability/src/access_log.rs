//! One structured line per request and per refresh cycle (§4.9).

use tracing::info;

/// Emit the one-line-per-request log entry: method, path, route key, client
/// IP, decision, status, latency.
#[allow(clippy::too_many_arguments)]
pub fn log_request(
    method: &str,
    path: &str,
    route_key: &str,
    client_ip: &str,
    decision: &str,
    status: u16,
    latency_ms: f64,
) {
    info!(
        method,
        path,
        route_key,
        client_ip,
        decision,
        status,
        latency_ms,
        "request"
    );
}

/// Emit the one-line-per-refresh-cycle log entry: outcome, route count,
/// duration.
pub fn log_refresh_cycle(outcome: &str, route_count: usize, duration_ms: f64) {
    info!(outcome, route_count, duration_ms, "refresh");
}
