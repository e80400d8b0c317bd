use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Health-check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// `GET /health`
///
/// Liveness of the gateway itself; says nothing about any node.
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            service: "node-verifier-gateway",
        }),
    )
}
