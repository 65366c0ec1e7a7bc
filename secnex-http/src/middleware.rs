use crate::server::AppState;
use axum::{
    Json,
    extract::State,
    http::{self, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use secnex_core::error::GatewayError;

/// Admin gate protecting the refresh endpoint (§9). Presence-only by
/// default; upgrades to an exact `Bearer <token>` match when
/// `admin_token` is configured.
pub async fn admin_gate(
    State(state): State<AppState>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let allowed = match (&state.admin_token, header) {
        (_, None) => false,
        (None, Some(h)) => !h.is_empty(),
        (Some(token), Some(h)) => h == format!("Bearer {token}"),
    };

    if allowed {
        next.run(request).await
    } else {
        let err = GatewayError::Unauthorized("admin gate rejected the request".to_string());
        (
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::UNAUTHORIZED),
            Json(err.to_json_body()),
        )
            .into_response()
    }
}
