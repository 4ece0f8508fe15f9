use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::IdAllocator;
use crate::models::{CacheState, Recipe, RecipeIngredient, RecipeStep, UserPreferences};

/// Errors from the external generation service.
///
/// `ContractViolation` means the service answered but broke its interface
/// (no `recipes` array); it is surfaced, never retried. `Failed` wraps
/// transport errors, timeouts, and declared upstream error payloads.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service violated its contract: {0}")]
    ContractViolation(String),

    #[error("generation failed: {0}")]
    Failed(String),
}

/// Inputs for one generation call: the requested ingredients, the already
/// optimized prompt, and the constraint lists from the preference snapshot.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub ingredients: Vec<String>,
    pub prompt: String,
    pub preferences: UserPreferences,
}

/// Capability to generate candidate recipes from an external service.
///
/// Implementations must return fully normalized transient recipes: steps
/// sorted by order index, temp ids assigned, cache state set.
#[async_trait::async_trait]
pub trait GenerateRecipes: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Recipe>, GenerationError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    ingredients: &'a [String],
    prompt: &'a str,
    dietary_restrictions: &'a [String],
    banned_ingredients: &'a [String],
    favorite_ingredients: &'a [String],
    allergies: &'a [String],
}

/// Response shape is untrusted: everything is optional so that a missing
/// `recipes` array is detected as a contract violation instead of a parse
/// error.
#[derive(Debug, Deserialize)]
pub struct WireResponse {
    pub recipes: Option<Vec<WireRecipe>>,
    pub detail: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireRecipe {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<WireIngredient>,
    #[serde(default)]
    pub steps: Vec<WireStep>,
    #[serde(default)]
    pub cooking_time: i32,
    #[serde(default = "default_servings")]
    pub servings: i32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub model_version: Option<String>,
}

const fn default_servings() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct WireIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    /// External services routinely omit this; absent means required.
    #[serde(default)]
    pub is_optional: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireStep {
    pub step: String,
    #[serde(default)]
    pub time: i32,
    pub order: i32,
}

/// Maps the untrusted wire recipes into the internal shape: steps sorted by
/// their declared order, missing optional flags defaulted, a temp id
/// minted, and the cache window opened.
pub fn normalize_recipes(
    raw: Vec<WireRecipe>,
    ids: &dyn IdAllocator,
    ttl_hours: i64,
) -> Vec<Recipe> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(ttl_hours);

    raw.into_iter()
        .map(|r| {
            let mut steps: Vec<RecipeStep> = r
                .steps
                .into_iter()
                .map(|s| RecipeStep {
                    text: s.step,
                    duration_minutes: s.time,
                    order_index: s.order,
                })
                .collect();
            steps.sort_by_key(|s| s.order_index);

            Recipe {
                recipe_id: ids.temp_id(),
                user_id: None,
                name: r.name,
                description: r.description,
                steps,
                ingredients: r
                    .ingredients
                    .into_iter()
                    .map(|i| RecipeIngredient {
                        name: i.name,
                        quantity: i.quantity,
                        unit: i.unit,
                        optional: i.is_optional.unwrap_or(false),
                        notes: i.notes,
                    })
                    .collect(),
                cooking_time: r.cooking_time,
                servings: r.servings,
                difficulty: r.difficulty.unwrap_or_else(|| "medium".to_string()),
                model_version: r.model_version,
                image_url: None,
                cache_state: CacheState::Cached { expires_at },
                created_at: now,
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct GeneratorClient {
    client: Client,
    base_url: String,
    api_key: String,
    ids: Arc<dyn IdAllocator>,
    ttl_hours: i64,
}

impl GeneratorClient {
    #[must_use]
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        ids: Arc<dyn IdAllocator>,
        ttl_hours: i64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            ids,
            ttl_hours,
        }
    }
}

#[async_trait::async_trait]
impl GenerateRecipes for GeneratorClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Recipe>, GenerationError> {
        let url = format!("{}/api/v1/generate-recipe", self.base_url);

        let body = WireRequest {
            ingredients: &request.ingredients,
            prompt: &request.prompt,
            dietary_restrictions: &request.preferences.dietary_restrictions,
            banned_ingredients: &request.preferences.banned_ingredients,
            favorite_ingredients: &request.preferences.favorite_ingredients,
            allergies: &request.preferences.allergies,
        };

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))?;

        let status = response.status();
        let payload: WireResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Failed(format!("unreadable response: {e}")))?;

        if !status.is_success() {
            let upstream = payload
                .detail
                .or(payload.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(GenerationError::Failed(upstream));
        }

        let Some(recipes) = payload.recipes else {
            return Err(GenerationError::ContractViolation(
                "response is missing the 'recipes' list".to_string(),
            ));
        };

        Ok(normalize_recipes(recipes, self.ids.as_ref(), self.ttl_hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UuidAllocator;

    fn wire_recipe_with_shuffled_steps() -> WireRecipe {
        WireRecipe {
            name: "Garlic Chicken".to_string(),
            description: None,
            ingredients: vec![WireIngredient {
                name: "chicken".to_string(),
                quantity: 500.0,
                unit: "g".to_string(),
                is_optional: None,
                notes: None,
            }],
            steps: vec![
                WireStep {
                    step: "serve".to_string(),
                    time: 1,
                    order: 3,
                },
                WireStep {
                    step: "marinate".to_string(),
                    time: 20,
                    order: 1,
                },
                WireStep {
                    step: "roast".to_string(),
                    time: 40,
                    order: 2,
                },
            ],
            cooking_time: 61,
            servings: 2,
            difficulty: None,
            model_version: Some("v3".to_string()),
        }
    }

    #[test]
    fn steps_are_sorted_by_declared_order() {
        let recipes = normalize_recipes(vec![wire_recipe_with_shuffled_steps()], &UuidAllocator, 48);

        let order: Vec<i32> = recipes[0].steps.iter().map(|s| s.order_index).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(recipes[0].steps[0].text, "marinate");
    }

    #[test]
    fn missing_optional_flag_defaults_to_required() {
        let recipes = normalize_recipes(vec![wire_recipe_with_shuffled_steps()], &UuidAllocator, 48);
        assert!(!recipes[0].ingredients[0].optional);
    }

    #[test]
    fn normalized_recipes_are_transient_cached() {
        let recipes = normalize_recipes(vec![wire_recipe_with_shuffled_steps()], &UuidAllocator, 48);

        assert!(recipes[0].recipe_id.is_temporary());
        match &recipes[0].cache_state {
            CacheState::Cached { expires_at } => assert!(*expires_at > Utc::now()),
            CacheState::Permanent => panic!("freshly generated recipes must be cached"),
        }
    }

    #[test]
    fn missing_recipes_list_is_a_contract_violation() {
        let payload: WireResponse =
            serde_json::from_str(r#"{"total": 0, "generation_time": 1.2}"#).unwrap();
        assert!(payload.recipes.is_none());
    }
}
