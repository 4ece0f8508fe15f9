use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::models::UserPreferences;

pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserPreferences>>, ApiError> {
    let prefs = state
        .shared
        .store
        .get_preferences(&user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load preferences: {}", e)))?;

    Ok(Json(ApiResponse::success(prefs)))
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(prefs): Json<UserPreferences>,
) -> Result<Json<ApiResponse<UserPreferences>>, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::validation("user_id is required"));
    }

    state
        .shared
        .store
        .upsert_preferences(&user_id, &prefs)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save preferences: {}", e)))?;

    Ok(Json(ApiResponse::success(prefs)))
}
