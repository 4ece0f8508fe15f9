use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::generator::{GenerateRecipes, GeneratorClient};
use crate::clients::unsplash::{SearchImages, UnsplashClient};
use crate::config::Config;
use crate::db::Store;
use crate::domain::{IdAllocator, UuidAllocator};
use crate::services::{
    CacheWriter, DefaultRecipeService, ImageEnricher, RecipeService, SimilarityIndex,
};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across all HTTP-based clients to enable connection pooling and
/// avoid socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Ladle/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub recipe_service: Arc<dyn RecipeService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http_client =
            build_shared_http_client(config.generation.request_timeout_seconds.into())?;

        let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);

        let generator: Arc<dyn GenerateRecipes> = Arc::new(GeneratorClient::new(
            http_client.clone(),
            config.generation.service_url.clone(),
            config.generation.api_key.clone(),
            ids.clone(),
            config.cache.recipe_ttl_hours,
        ));

        let access_key = (!config.images.unsplash_access_key.is_empty())
            .then(|| config.images.unsplash_access_key.clone());
        let image_search: Arc<dyn SearchImages> = Arc::new(UnsplashClient::new(
            http_client,
            config.images.unsplash_base_url.clone(),
            access_key,
        ));

        Self::with_capabilities(config, generator, image_search, ids).await
    }

    /// Wires the pipeline with explicit capability implementations. Tests
    /// substitute fakes here.
    pub async fn with_capabilities(
        config: Config,
        generator: Arc<dyn GenerateRecipes>,
        image_search: Arc<dyn SearchImages>,
        ids: Arc<dyn IdAllocator>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let similarity = SimilarityIndex::new(store.clone(), config.cache.clone());
        let enricher = ImageEnricher::new(
            store.clone(),
            image_search,
            config.images.default_images.clone(),
        );
        let writer = CacheWriter::new(store.clone(), ids);

        let recipe_service: Arc<dyn RecipeService> = Arc::new(DefaultRecipeService::new(
            store.clone(),
            similarity,
            generator,
            enricher,
            writer,
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            recipe_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
