use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use tracing::{error, instrument};

use crate::{response::ApiResponse, state::AppState};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    match state.accounts.store().ping().await {
        Ok(()) => ApiResponse::new(
            StatusCode::OK,
            "health check",
            HealthStatus {
                status: "healthy",
                database: "healthy",
            },
        ),
        Err(e) => {
            error!(error = %e, "database ping failed");
            ApiResponse::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "health check",
                HealthStatus {
                    status: "unhealthy",
                    database: "unhealthy",
                },
            )
        }
    }
}
