use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::db::Store;
use crate::domain::IdAllocator;
use crate::models::Recipe;

/// Persists a validated, enriched recipe as a cache entry.
///
/// The write is two-step: header first, then ingredient and step rows
/// referencing the new persistent id. If the child insert fails, the
/// just-inserted header is deleted before the error is returned, so no
/// ingredient-less recipe row is ever left behind. The compensating delete
/// stands in for a multi-table transaction, matching the narrow store
/// contract.
pub struct CacheWriter {
    store: Store,
    ids: Arc<dyn IdAllocator>,
}

impl CacheWriter {
    #[must_use]
    pub const fn new(store: Store, ids: Arc<dyn IdAllocator>) -> Self {
        Self { store, ids }
    }

    /// Writes `recipe` for `owner` and returns the stored form carrying
    /// its persistent id.
    pub async fn persist(&self, recipe: &Recipe, owner: &str) -> Result<Recipe> {
        let id = self.ids.recipe_id();

        let mut stored = recipe.clone();
        stored.recipe_id = id.clone();
        stored.user_id = Some(owner.to_string());
        stored.sort_steps();

        self.store
            .insert_recipe_header(&id, &stored)
            .await
            .with_context(|| format!("failed to insert recipe header for '{}'", recipe.name))?;

        if let Err(e) = self
            .store
            .insert_recipe_children(&id, &stored.ingredients, &stored.steps)
            .await
        {
            warn!(recipe = %recipe.name, "child insert failed, rolling back header: {e}");
            if let Err(del) = self.store.delete_recipe_header(&id).await {
                // The sweep will still reclaim the orphan once it expires.
                warn!(recipe_id = %id, "compensating delete failed: {del}");
            }
            return Err(e).with_context(|| {
                format!("failed to insert ingredients/steps for '{}'", recipe.name)
            });
        }

        debug!(recipe_id = %id, recipe = %stored.name, "recipe cached");
        Ok(stored)
    }
}
