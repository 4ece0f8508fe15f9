use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, Value,
    sea_query::{Condition, Expr},
};

use crate::domain::RecipeId;
use crate::entities::{prelude::*, recipe_ingredients, recipe_steps, recipes};
use crate::models::{CacheState, Recipe, RecipeIngredient, RecipeStep};

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_header(
        model: recipes::Model,
        ingredients: Vec<recipe_ingredients::Model>,
        steps: Vec<recipe_steps::Model>,
    ) -> Recipe {
        let cache_state = if model.is_cached {
            CacheState::Cached {
                expires_at: model
                    .cached_until
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map_or_else(Utc::now, |t| t.with_timezone(&Utc)),
            }
        } else {
            CacheState::Permanent
        };

        let mut steps: Vec<RecipeStep> = steps
            .into_iter()
            .map(|s| RecipeStep {
                text: s.text,
                duration_minutes: s.duration_minutes,
                order_index: s.order_index,
            })
            .collect();
        steps.sort_by_key(|s| s.order_index);

        Recipe {
            recipe_id: RecipeId::new(model.id),
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            steps,
            ingredients: ingredients
                .into_iter()
                .map(|i| RecipeIngredient {
                    name: i.name,
                    quantity: i.quantity,
                    unit: i.unit,
                    optional: i.optional,
                    notes: i.notes,
                })
                .collect(),
            cooking_time: model.cooking_time,
            servings: model.servings,
            difficulty: model.difficulty,
            model_version: model.model_version,
            image_url: model.image_url,
            cache_state,
            created_at: model
                .created_at
                .parse::<DateTime<Utc>>()
                .unwrap_or_else(|_| Utc::now()),
        }
    }

    /// Inserts the recipe header row only. Child rows are written by
    /// [`Self::insert_children`]; on their failure the caller compensates
    /// with [`Self::delete_header`].
    pub async fn insert_header(&self, id: &RecipeId, recipe: &Recipe) -> Result<()> {
        let (is_cached, cached_until) = match &recipe.cache_state {
            CacheState::Cached { expires_at } => (true, Some(expires_at.to_rfc3339())),
            CacheState::Permanent => (false, None),
        };

        let model = recipes::ActiveModel {
            id: Set(id.as_str().to_string()),
            user_id: Set(recipe.user_id.clone()),
            name: Set(recipe.name.clone()),
            description: Set(recipe.description.clone()),
            cooking_time: Set(recipe.cooking_time),
            servings: Set(recipe.servings),
            difficulty: Set(recipe.difficulty.clone()),
            model_version: Set(recipe.model_version.clone()),
            image_url: Set(recipe.image_url.clone()),
            is_cached: Set(is_cached),
            cached_until: Set(cached_until),
            created_at: Set(recipe.created_at.to_rfc3339()),
        };

        Recipes::insert(model).exec(&self.conn).await?;
        Ok(())
    }

    /// Inserts the ingredient and step rows for a recipe header.
    pub async fn insert_children(
        &self,
        id: &RecipeId,
        ingredients: &[RecipeIngredient],
        steps: &[RecipeStep],
    ) -> Result<()> {
        if !ingredients.is_empty() {
            let rows: Vec<recipe_ingredients::ActiveModel> = ingredients
                .iter()
                .map(|i| recipe_ingredients::ActiveModel {
                    recipe_id: Set(id.as_str().to_string()),
                    name: Set(i.name.clone()),
                    quantity: Set(i.quantity),
                    unit: Set(i.unit.clone()),
                    optional: Set(i.optional),
                    notes: Set(i.notes.clone()),
                    ..Default::default()
                })
                .collect();
            RecipeIngredients::insert_many(rows).exec(&self.conn).await?;
        }

        if !steps.is_empty() {
            let rows: Vec<recipe_steps::ActiveModel> = steps
                .iter()
                .map(|s| recipe_steps::ActiveModel {
                    recipe_id: Set(id.as_str().to_string()),
                    text: Set(s.text.clone()),
                    duration_minutes: Set(s.duration_minutes),
                    order_index: Set(s.order_index),
                    ..Default::default()
                })
                .collect();
            RecipeSteps::insert_many(rows).exec(&self.conn).await?;
        }

        Ok(())
    }

    /// Compensating delete for a header whose child insert failed. Cascade
    /// removes any child rows that did land.
    pub async fn delete_header(&self, id: &RecipeId) -> Result<()> {
        Recipes::delete_by_id(id.as_str()).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>> {
        let Some(header) = Recipes::find_by_id(id.as_str()).one(&self.conn).await? else {
            return Ok(None);
        };

        let ingredients = RecipeIngredients::find()
            .filter(recipe_ingredients::Column::RecipeId.eq(id.as_str()))
            .all(&self.conn)
            .await?;
        let steps = RecipeSteps::find()
            .filter(recipe_steps::Column::RecipeId.eq(id.as_str()))
            .order_by_asc(recipe_steps::Column::OrderIndex)
            .all(&self.conn)
            .await?;

        Ok(Some(Self::map_header(header, ingredients, steps)))
    }

    /// All recipes still eligible for similarity reuse: cached entries with
    /// a future expiry plus promoted (permanent) ones, optionally filtered
    /// to entries owned by `owner` or anonymous/shared.
    pub async fn find_unexpired(&self, owner: Option<&str>) -> Result<Vec<Recipe>> {
        let now = Utc::now().to_rfc3339();

        let mut query = Recipes::find().filter(
            Condition::any()
                .add(recipes::Column::IsCached.eq(false))
                .add(
                    Condition::all()
                        .add(recipes::Column::IsCached.eq(true))
                        .add(recipes::Column::CachedUntil.gt(&now)),
                ),
        );

        if let Some(owner) = owner {
            query = query.filter(
                Condition::any()
                    .add(recipes::Column::UserId.eq(owner))
                    .add(recipes::Column::UserId.is_null()),
            );
        }

        let headers = query.all(&self.conn).await?;
        self.attach_children(headers).await
    }

    /// Unexpired cached (not yet promoted) entries owned by `owner`.
    pub async fn find_cached_by_owner(&self, owner: &str) -> Result<Vec<Recipe>> {
        let now = Utc::now().to_rfc3339();

        let headers = Recipes::find()
            .filter(recipes::Column::IsCached.eq(true))
            .filter(recipes::Column::CachedUntil.gt(&now))
            .filter(recipes::Column::UserId.eq(owner))
            .order_by_desc(recipes::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        self.attach_children(headers).await
    }

    async fn attach_children(&self, headers: Vec<recipes::Model>) -> Result<Vec<Recipe>> {
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = headers.iter().map(|h| h.id.as_str()).collect();

        let mut ingredients_by_recipe: HashMap<String, Vec<recipe_ingredients::Model>> =
            HashMap::new();
        for row in RecipeIngredients::find()
            .filter(recipe_ingredients::Column::RecipeId.is_in(ids.clone()))
            .all(&self.conn)
            .await?
        {
            ingredients_by_recipe
                .entry(row.recipe_id.clone())
                .or_default()
                .push(row);
        }

        let mut steps_by_recipe: HashMap<String, Vec<recipe_steps::Model>> = HashMap::new();
        for row in RecipeSteps::find()
            .filter(recipe_steps::Column::RecipeId.is_in(ids))
            .all(&self.conn)
            .await?
        {
            steps_by_recipe
                .entry(row.recipe_id.clone())
                .or_default()
                .push(row);
        }

        Ok(headers
            .into_iter()
            .map(|h| {
                let ingredients = ingredients_by_recipe.remove(&h.id).unwrap_or_default();
                let steps = steps_by_recipe.remove(&h.id).unwrap_or_default();
                Self::map_header(h, ingredients, steps)
            })
            .collect())
    }

    /// One-way promotion of a cached entry to permanent. Returns false when
    /// no cached row with this id exists (already permanent or unknown).
    pub async fn promote(&self, id: &RecipeId) -> Result<bool> {
        let updated = Recipes::update_many()
            .col_expr(recipes::Column::IsCached, Expr::value(Value::Bool(Some(false))))
            .col_expr(
                recipes::Column::CachedUntil,
                Expr::value(Value::String(None)),
            )
            .filter(recipes::Column::Id.eq(id.as_str()))
            .filter(recipes::Column::IsCached.eq(true))
            .exec(&self.conn)
            .await?;

        Ok(updated.rows_affected > 0)
    }

    /// Deletes cached entries whose expiry has passed. Permanent rows are
    /// never touched. Idempotent; returns the number of rows removed.
    pub async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = Recipes::delete_many()
            .filter(recipes::Column::IsCached.eq(true))
            .filter(recipes::Column::CachedUntil.lte(cutoff.to_rfc3339()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
