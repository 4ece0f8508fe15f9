use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::RecipeId;

/// Cache lifecycle of a recipe.
///
/// A recipe is either cached with a future expiry or permanent, never both.
/// Promotion (cached -> permanent) is one-directional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CacheState {
    Cached { expires_at: DateTime<Utc> },
    Permanent,
}

impl CacheState {
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Cached { expires_at } => *expires_at <= now,
            Self::Permanent => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub recipe_id: RecipeId,
    /// Owning user; cache entries may be anonymous/shared.
    pub user_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<RecipeStep>,
    pub ingredients: Vec<RecipeIngredient>,
    /// Total cooking time in minutes.
    pub cooking_time: i32,
    pub servings: i32,
    pub difficulty: String,
    /// Provenance of the generator that produced this recipe.
    pub model_version: Option<String>,
    pub image_url: Option<String>,
    pub cache_state: CacheState,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// Sorts steps ascending by their order index. The order index is
    /// authoritative; callers must not rely on insertion order.
    pub fn sort_steps(&mut self) {
        self.steps.sort_by_key(|s| s.order_index);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeStep {
    pub text: String,
    /// Duration of this step in minutes.
    pub duration_minutes: i32,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub optional: bool,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn cached_state_expiry() {
        let now = Utc::now();
        let live = CacheState::Cached {
            expires_at: now + Duration::hours(1),
        };
        let dead = CacheState::Cached {
            expires_at: now - Duration::hours(1),
        };
        assert!(!live.is_expired(now));
        assert!(dead.is_expired(now));
        assert!(!CacheState::Permanent.is_expired(now));
    }

    #[test]
    fn sort_steps_orders_by_index() {
        let mut recipe = Recipe {
            recipe_id: "r1".into(),
            user_id: None,
            name: "Test".to_string(),
            description: None,
            steps: vec![
                RecipeStep {
                    text: "third".to_string(),
                    duration_minutes: 5,
                    order_index: 3,
                },
                RecipeStep {
                    text: "first".to_string(),
                    duration_minutes: 1,
                    order_index: 1,
                },
                RecipeStep {
                    text: "second".to_string(),
                    duration_minutes: 2,
                    order_index: 2,
                },
            ],
            ingredients: vec![],
            cooking_time: 10,
            servings: 2,
            difficulty: "easy".to_string(),
            model_version: None,
            image_url: None,
            cache_state: CacheState::Permanent,
            created_at: Utc::now(),
        };

        recipe.sort_steps();

        let order: Vec<i32> = recipe.steps.iter().map(|s| s.order_index).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
