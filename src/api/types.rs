use serde::{Deserialize, Serialize};

use crate::models::{CacheState, Recipe, RecipeIngredient, RecipeStep};
use crate::services::{ValidatedRecipe, ValidationSummary};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub recipe_id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<RecipeStep>,
    pub ingredients: Vec<RecipeIngredient>,
    pub cooking_time: i32,
    pub servings: i32,
    pub difficulty: String,
    pub model_version: Option<String>,
    pub image_url: Option<String>,
    pub is_cached: bool,
    pub cached_until: Option<String>,
    pub created_at: String,
}

impl From<Recipe> for RecipeDto {
    fn from(recipe: Recipe) -> Self {
        let (is_cached, cached_until) = match &recipe.cache_state {
            CacheState::Cached { expires_at } => (true, Some(expires_at.to_rfc3339())),
            CacheState::Permanent => (false, None),
        };

        Self {
            recipe_id: recipe.recipe_id.to_string(),
            user_id: recipe.user_id,
            name: recipe.name,
            description: recipe.description,
            steps: recipe.steps,
            ingredients: recipe.ingredients,
            cooking_time: recipe.cooking_time,
            servings: recipe.servings,
            difficulty: recipe.difficulty,
            model_version: recipe.model_version,
            image_url: recipe.image_url,
            is_cached,
            cached_until,
            created_at: recipe.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GeneratedRecipeDto {
    #[serde(flatten)]
    pub recipe: RecipeDto,
    pub is_safe: bool,
    pub issues: Vec<String>,
}

impl From<ValidatedRecipe> for GeneratedRecipeDto {
    fn from(validated: ValidatedRecipe) -> Self {
        Self {
            recipe: validated.recipe.into(),
            is_safe: validated.is_safe,
            issues: validated.issues,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponseDto {
    pub recipes: Vec<GeneratedRecipeDto>,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_summary: Option<ValidationSummary>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub user_id: String,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRecipeRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResultDto {
    pub deleted_recipes: u64,
    pub deleted_images: u64,
}
