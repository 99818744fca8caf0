use crate::api::models::documents::HealthResponse;
use axum::Json;

/// Message returned by the liveness route.
pub const HEALTH_MESSAGE: &str = "Backend is running successfully";

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    summary = "Liveness check",
    responses(
        (status = 200, description = "The service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: HEALTH_MESSAGE.to_string(),
    })
}
