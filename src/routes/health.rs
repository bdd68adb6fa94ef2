use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness only; deliberately touches neither the database nor the
/// oracle.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
