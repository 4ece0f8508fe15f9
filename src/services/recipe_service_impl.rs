//! Default implementation of [`RecipeService`] wiring the pipeline stages
//! together over the SQLite-backed store.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::clients::generator::{GenerateRecipes, GenerationRequest};
use crate::db::Store;
use crate::domain::RecipeId;
use crate::models::Recipe;
use crate::services::cache_writer::CacheWriter;
use crate::services::enrichment::ImageEnricher;
use crate::services::prompt::optimize_prompt;
use crate::services::recipe_service::{
    GenerationOutcome, RecipeError, RecipeService, ValidatedRecipe, ValidationSummary,
};
use crate::services::similarity::SimilarityIndex;
use crate::services::validation::validate_recipe;

pub struct DefaultRecipeService {
    store: Store,
    similarity: SimilarityIndex,
    generator: Arc<dyn GenerateRecipes>,
    enricher: ImageEnricher,
    writer: CacheWriter,
}

impl DefaultRecipeService {
    #[must_use]
    pub const fn new(
        store: Store,
        similarity: SimilarityIndex,
        generator: Arc<dyn GenerateRecipes>,
        enricher: ImageEnricher,
        writer: CacheWriter,
    ) -> Self {
        Self {
            store,
            similarity,
            generator,
            enricher,
            writer,
        }
    }
}

#[async_trait::async_trait]
impl RecipeService for DefaultRecipeService {
    async fn generate(
        &self,
        user_id: &str,
        ingredients: &[String],
        prompt: &str,
    ) -> Result<GenerationOutcome, RecipeError> {
        let prefs = self.store.get_preferences(user_id).await?;

        // Stage 1: similarity lookup; a hit ends the request.
        let similar = self
            .similarity
            .find_similar(ingredients, Some(user_id))
            .await?;

        if !similar.is_empty() {
            metrics::counter!("recipe_cache_hits_total").increment(1);
            info!(
                user = %user_id,
                matches = similar.len(),
                "similar cached recipes found, skipping generation"
            );
            return Ok(GenerationOutcome {
                recipes: similar
                    .into_iter()
                    .map(ValidatedRecipe::passthrough)
                    .collect(),
                from_cache: true,
                validation_summary: None,
            });
        }
        metrics::counter!("recipe_cache_misses_total").increment(1);

        // Stage 2: prompt optimization, exactly once per request.
        let optimized = optimize_prompt(prompt, &prefs);

        // Stage 3: external generation; failure aborts the request.
        let request = GenerationRequest {
            ingredients: ingredients.to_vec(),
            prompt: optimized,
            preferences: prefs.clone(),
        };
        let generated = match self.generator.generate(&request).await {
            Ok(recipes) => recipes,
            Err(e) => {
                metrics::counter!("recipe_generation_failures_total").increment(1);
                return Err(e.into());
            }
        };

        // Stage 4: validate every candidate independently.
        let mut validated: Vec<ValidatedRecipe> = generated
            .into_iter()
            .map(|recipe| {
                let verdict =
                    validate_recipe(&recipe, &prefs.allergies, &prefs.banned_ingredients);
                ValidatedRecipe::new(recipe, verdict)
            })
            .collect();

        // Stage 5: enrich all candidates, safe and unsafe, so the caller
        // always gets an image.
        let names: Vec<String> = validated.iter().map(|v| v.recipe.name.clone()).collect();
        let images = self.enricher.enrich_batch(&names).await;
        for entry in &mut validated {
            entry.recipe.image_url = images.get(&entry.recipe.name).cloned();
        }

        // Stage 6: persist the safe ones; a failure for one recipe is
        // logged and skipped, the others proceed.
        let mut persisted = 0usize;
        for entry in &mut validated {
            if !entry.is_safe {
                continue;
            }
            match self.writer.persist(&entry.recipe, user_id).await {
                Ok(stored) => {
                    entry.recipe = stored;
                    persisted += 1;
                }
                Err(e) => {
                    metrics::counter!("recipe_persist_failures_total").increment(1);
                    warn!(recipe = %entry.recipe.name, "failed to cache recipe: {e}");
                }
            }
        }

        let summary = ValidationSummary::of(&validated);
        info!(
            user = %user_id,
            total = summary.total,
            safe = summary.safe,
            persisted,
            "generation pipeline complete"
        );

        Ok(GenerationOutcome {
            recipes: validated,
            from_cache: false,
            validation_summary: Some(summary),
        })
    }

    async fn promote(&self, user_id: &str, recipe_id: &RecipeId) -> Result<Recipe, RecipeError> {
        let mut recipe = self
            .store
            .get_recipe(recipe_id)
            .await?
            .ok_or_else(|| RecipeError::NotFound(recipe_id.clone()))?;

        if let Some(owner) = &recipe.user_id
            && owner != user_id
        {
            return Err(RecipeError::Forbidden(
                "cannot save another user's recipe".to_string(),
            ));
        }

        if recipe.cache_state.is_permanent() {
            return Err(RecipeError::Conflict("recipe is already saved".to_string()));
        }

        if !self.store.promote_recipe(recipe_id).await? {
            return Err(RecipeError::Conflict("recipe is already saved".to_string()));
        }

        info!(user = %user_id, recipe_id = %recipe_id, "recipe promoted to permanent");
        recipe.cache_state = crate::models::CacheState::Permanent;
        Ok(recipe)
    }

    async fn cached_for_user(&self, user_id: &str) -> Result<Vec<Recipe>, RecipeError> {
        Ok(self.store.cached_recipes_for_user(user_id).await?)
    }

    async fn get_recipe(
        &self,
        user_id: &str,
        recipe_id: &RecipeId,
    ) -> Result<Recipe, RecipeError> {
        let recipe = self
            .store
            .get_recipe(recipe_id)
            .await?
            .ok_or_else(|| RecipeError::NotFound(recipe_id.clone()))?;

        let owned = recipe.user_id.as_deref().is_none_or(|owner| owner == user_id);
        let shared_cache_entry = !recipe.cache_state.is_expired(Utc::now())
            && !recipe.cache_state.is_permanent();

        if owned || shared_cache_entry {
            Ok(recipe)
        } else {
            Err(RecipeError::Forbidden("access denied".to_string()))
        }
    }

    async fn purge_expired(&self) -> Result<u64, RecipeError> {
        let deleted = self.store.delete_expired_recipes(Utc::now()).await?;
        if deleted > 0 {
            info!(deleted, "expired cached recipes removed");
        }
        metrics::counter!("recipe_cache_purged_total").increment(deleted);
        Ok(deleted)
    }
}
