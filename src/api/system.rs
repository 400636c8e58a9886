use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, HealthResponse};

/// GET /health
///
/// Reports 500 when the database cannot answer a trivial query.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    state.store().ping().await.map_err(|e| {
        tracing::error!(error = %e, "Health check failed");
        ApiError::DependencyUnavailable("Database is unavailable".to_string())
    })?;

    Ok(Json(ApiResponse::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })))
}
