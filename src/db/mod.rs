use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::RecipeId;
use crate::models::{Recipe, RecipeIngredient, RecipeStep, UserPreferences};

pub mod migrator;
pub mod repositories;

pub use repositories::image_cache::CachedImage;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn image_cache_repo(&self) -> repositories::image_cache::ImageCacheRepository {
        repositories::image_cache::ImageCacheRepository::new(self.conn.clone())
    }

    fn preferences_repo(&self) -> repositories::preferences::PreferencesRepository {
        repositories::preferences::PreferencesRepository::new(self.conn.clone())
    }

    // Recipe store contract

    pub async fn insert_recipe_header(&self, id: &RecipeId, recipe: &Recipe) -> Result<()> {
        self.recipe_repo().insert_header(id, recipe).await
    }

    pub async fn insert_recipe_children(
        &self,
        id: &RecipeId,
        ingredients: &[RecipeIngredient],
        steps: &[RecipeStep],
    ) -> Result<()> {
        self.recipe_repo()
            .insert_children(id, ingredients, steps)
            .await
    }

    pub async fn delete_recipe_header(&self, id: &RecipeId) -> Result<()> {
        self.recipe_repo().delete_header(id).await
    }

    pub async fn get_recipe(&self, id: &RecipeId) -> Result<Option<Recipe>> {
        self.recipe_repo().find_by_id(id).await
    }

    pub async fn unexpired_recipes(&self, owner: Option<&str>) -> Result<Vec<Recipe>> {
        self.recipe_repo().find_unexpired(owner).await
    }

    pub async fn cached_recipes_for_user(&self, owner: &str) -> Result<Vec<Recipe>> {
        self.recipe_repo().find_cached_by_owner(owner).await
    }

    pub async fn promote_recipe(&self, id: &RecipeId) -> Result<bool> {
        self.recipe_repo().promote(id).await
    }

    pub async fn delete_expired_recipes(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.recipe_repo().delete_expired(cutoff).await
    }

    // Image cache contract

    pub async fn get_cached_image(&self, name_hash: &str) -> Result<Option<CachedImage>> {
        self.image_cache_repo().get(name_hash).await
    }

    pub async fn cache_image(&self, name_hash: &str, image_url: &str, source: &str) -> Result<()> {
        self.image_cache_repo()
            .upsert(name_hash, image_url, source)
            .await
    }

    pub async fn delete_images_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.image_cache_repo().delete_older_than(cutoff).await
    }

    // Preferences

    pub async fn get_preferences(&self, user_id: &str) -> Result<UserPreferences> {
        self.preferences_repo().get(user_id).await
    }

    pub async fn upsert_preferences(&self, user_id: &str, prefs: &UserPreferences) -> Result<()> {
        self.preferences_repo().upsert(user_id, prefs).await
    }
}
