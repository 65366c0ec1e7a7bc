use crate::server::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// `POST {base}/gateway/refresh` — triggers the Refresher synchronously
/// (§4.6, §6). The admin gate has already run by the time this handler
/// is reached.
pub async fn refresh(State(state): State<AppState>) -> Response {
    match state.refresher.refresh_once().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({"code": 200, "message": "Routes refreshed"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(e.to_json_body()),
        )
            .into_response(),
    }
}
