use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{Value, json};

/// Handler for `GET /healthz`: liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz`: readiness check with the server clock, so operators can spot
/// skew that would distort OTP expiry.
pub async fn readyz() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() })),
    )
}
