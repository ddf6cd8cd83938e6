/*
 * Responsibility
 * - GET /health (liveness; not behind the identity hook)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::middleware::auth::TrustLevel;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let trust_level = match state.identity.trust_level() {
        TrustLevel::Trusted => "trusted",
        TrustLevel::Untrusted => "untrusted",
    };
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "trust_level": trust_level})),
    )
}
