use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::types::PurgeResultDto;
use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub database_ok: bool,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let database_ok = state.shared.store.ping().await.is_ok();

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database_ok,
    })))
}

/// One-shot maintenance sweep: expired cached recipes plus image-cache
/// entries past their max age. Idempotent; rows already gone are simply
/// not counted again.
pub async fn run_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PurgeResultDto>>, ApiError> {
    let deleted_recipes = state.shared.recipe_service.purge_expired().await?;

    let max_age_days = state.shared.config.read().await.images.cache_max_age_days;
    let cutoff = Utc::now() - Duration::days(max_age_days);
    let deleted_images = state
        .shared
        .store
        .delete_images_older_than(cutoff)
        .await
        .map_err(|e| ApiError::internal(format!("Image cache sweep failed: {}", e)))?;

    Ok(Json(ApiResponse::success(PurgeResultDto {
        deleted_recipes,
        deleted_images,
    })))
}
