//! Domain service for the recipe generation pipeline.
//!
//! This is the top-level use case: cache lookup, prompt optimization,
//! generation, safety validation, image enrichment, and persistence of the
//! safe results. Collaborators come in as injected capabilities so the
//! whole pipeline runs against fakes in tests.

use serde::Serialize;
use thiserror::Error;

use crate::clients::generator::GenerationError;
use crate::domain::RecipeId;
use crate::models::Recipe;
use crate::services::validation::ValidationResult;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("recipe not found: {0}")]
    NotFound(RecipeId),

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// A recipe paired with the verdict of the preference validator. Unsafe
/// recipes are returned so the caller can see why a candidate was
/// rejected, but they are never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub is_safe: bool,
    pub issues: Vec<String>,
}

impl ValidatedRecipe {
    #[must_use]
    pub fn new(recipe: Recipe, verdict: ValidationResult) -> Self {
        Self {
            recipe,
            is_safe: verdict.is_safe,
            issues: verdict.issues,
        }
    }

    /// A cache hit or stored recipe is returned as-is, with no fresh
    /// validation verdict attached.
    #[must_use]
    pub fn passthrough(recipe: Recipe) -> Self {
        Self {
            recipe,
            is_safe: true,
            issues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub safe: usize,
    pub with_issues: usize,
}

impl ValidationSummary {
    #[must_use]
    pub fn of(recipes: &[ValidatedRecipe]) -> Self {
        let safe = recipes.iter().filter(|r| r.is_safe).count();
        Self {
            total: recipes.len(),
            safe,
            with_issues: recipes.len() - safe,
        }
    }
}

/// Result of one generation request.
#[derive(Debug, Serialize)]
pub struct GenerationOutcome {
    pub recipes: Vec<ValidatedRecipe>,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_summary: Option<ValidationSummary>,
}

#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// Runs the full pipeline for one request. Short-circuits on a
    /// similarity cache hit; otherwise generates, validates, enriches, and
    /// persists the safe recipes.
    ///
    /// # Errors
    ///
    /// - [`RecipeError::Generation`] when the external generation call
    ///   fails or violates its contract; the whole request fails.
    /// - [`RecipeError::Database`] on store failures outside the
    ///   per-recipe persistence step (those are absorbed).
    async fn generate(
        &self,
        user_id: &str,
        ingredients: &[String],
        prompt: &str,
    ) -> Result<GenerationOutcome, RecipeError>;

    /// Promotes a cached recipe to permanent for the requesting user.
    /// One-directional; promoting an already-permanent recipe is a
    /// conflict.
    async fn promote(&self, user_id: &str, recipe_id: &RecipeId) -> Result<Recipe, RecipeError>;

    /// Unexpired cached recipes owned by the user.
    async fn cached_for_user(&self, user_id: &str) -> Result<Vec<Recipe>, RecipeError>;

    /// Fetches one recipe, readable when anonymous, owned by the
    /// requester, or still in cache.
    async fn get_recipe(&self, user_id: &str, recipe_id: &RecipeId)
    -> Result<Recipe, RecipeError>;

    /// Deletes expired cache entries; idempotent, safe to run on a
    /// schedule. Returns the number of recipes removed.
    async fn purge_expired(&self) -> Result<u64, RecipeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CacheState;
    use chrono::Utc;

    fn recipe(name: &str) -> Recipe {
        Recipe {
            recipe_id: "r".into(),
            user_id: None,
            name: name.to_string(),
            description: None,
            steps: vec![],
            ingredients: vec![],
            cooking_time: 0,
            servings: 1,
            difficulty: "easy".to_string(),
            model_version: None,
            image_url: None,
            cache_state: CacheState::Permanent,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summary_counts_safe_and_flagged() {
        let recipes = vec![
            ValidatedRecipe::new(
                recipe("a"),
                ValidationResult {
                    is_safe: true,
                    issues: vec![],
                },
            ),
            ValidatedRecipe::new(
                recipe("b"),
                ValidationResult {
                    is_safe: false,
                    issues: vec!["contains walnuts".to_string()],
                },
            ),
        ];

        let summary = ValidationSummary::of(&recipes);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.safe, 1);
        assert_eq!(summary.with_issues, 1);
    }
}
