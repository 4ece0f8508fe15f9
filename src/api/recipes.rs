use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::types::{
    GenerateRequest, GenerateResponseDto, GeneratedRecipeDto, RecipeDto, SaveRecipeRequest,
    UserQuery,
};
use super::{ApiError, ApiResponse, AppState};
use crate::constants::limits::MAX_REQUEST_INGREDIENTS;
use crate::domain::RecipeId;

pub async fn generate_recipes(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponseDto>>, ApiError> {
    if request.user_id.trim().is_empty() {
        return Err(ApiError::validation("user_id is required"));
    }

    let ingredients: Vec<String> = request
        .ingredients
        .iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();

    if ingredients.is_empty() {
        return Err(ApiError::validation("at least one ingredient is required"));
    }

    if ingredients.len() > MAX_REQUEST_INGREDIENTS {
        return Err(ApiError::validation(format!(
            "too many ingredients (max {})",
            MAX_REQUEST_INGREDIENTS
        )));
    }

    let outcome = state
        .shared
        .recipe_service
        .generate(
            &request.user_id,
            &ingredients,
            request.prompt.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(Json(ApiResponse::success(GenerateResponseDto {
        recipes: outcome
            .recipes
            .into_iter()
            .map(GeneratedRecipeDto::from)
            .collect(),
        from_cache: outcome.from_cache,
        validation_summary: outcome.validation_summary,
    })))
}

pub async fn save_recipe(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
    Json(request): Json<SaveRecipeRequest>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let recipe = state
        .shared
        .recipe_service
        .promote(&request.user_id, &RecipeId::new(recipe_id))
        .await?;

    Ok(Json(ApiResponse::success(recipe.into())))
}

pub async fn list_cached(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<Vec<RecipeDto>>>, ApiError> {
    let recipes = state
        .shared
        .recipe_service
        .cached_for_user(&query.user_id)
        .await?;

    Ok(Json(ApiResponse::success(
        recipes.into_iter().map(RecipeDto::from).collect(),
    )))
}

pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let recipe = state
        .shared
        .recipe_service
        .get_recipe(&query.user_id, &RecipeId::new(recipe_id))
        .await?;

    Ok(Json(ApiResponse::success(recipe.into())))
}
