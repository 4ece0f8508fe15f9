//! End-to-end tests for the generation pipeline over a real SQLite store,
//! with fake generation and image-search capabilities.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, EntityTrait};

use ladle::clients::generator::{GenerateRecipes, GenerationError, GenerationRequest};
use ladle::clients::unsplash::{ImageCandidate, ImageSearchError, SearchImages};
use ladle::config::CacheConfig;
use ladle::db::Store;
use ladle::domain::{IdAllocator, RecipeId, UuidAllocator};
use ladle::models::{CacheState, Recipe, RecipeIngredient, RecipeStep, UserPreferences};
use ladle::services::{
    CacheWriter, DefaultRecipeService, ImageEnricher, RecipeError, RecipeService, SimilarityIndex,
};

async fn test_store() -> Store {
    let db_path = std::env::temp_dir().join(format!("ladle-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to create test store")
}

fn transient_recipe(name: &str, ingredient_names: &[&str]) -> Recipe {
    Recipe {
        recipe_id: UuidAllocator.temp_id(),
        user_id: None,
        name: name.to_string(),
        description: Some(format!("{name} for tests")),
        steps: vec![
            RecipeStep {
                text: "prep".to_string(),
                duration_minutes: 5,
                order_index: 1,
            },
            RecipeStep {
                text: "cook".to_string(),
                duration_minutes: 20,
                order_index: 2,
            },
        ],
        ingredients: ingredient_names
            .iter()
            .map(|n| RecipeIngredient {
                name: (*n).to_string(),
                quantity: 1.0,
                unit: "unit".to_string(),
                optional: false,
                notes: None,
            })
            .collect(),
        cooking_time: 25,
        servings: 2,
        difficulty: "easy".to_string(),
        model_version: Some("test-v1".to_string()),
        image_url: None,
        cache_state: CacheState::Cached {
            expires_at: Utc::now() + Duration::hours(48),
        },
        created_at: Utc::now(),
    }
}

struct FakeGenerator {
    recipes: Vec<Recipe>,
    calls: AtomicUsize,
}

impl FakeGenerator {
    fn returning(recipes: Vec<Recipe>) -> Arc<Self> {
        Arc::new(Self {
            recipes,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GenerateRecipes for FakeGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<Vec<Recipe>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.recipes.clone())
    }
}

struct FailingGenerator;

#[async_trait::async_trait]
impl GenerateRecipes for FailingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<Vec<Recipe>, GenerationError> {
        Err(GenerationError::Failed("upstream exploded".to_string()))
    }
}

struct FakeImageSearch {
    results: Vec<String>,
    calls: AtomicUsize,
    fail: bool,
}

impl FakeImageSearch {
    fn returning(urls: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            results: urls.iter().map(ToString::to_string).collect(),
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            results: vec![],
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SearchImages for FakeImageSearch {
    async fn search(&self, _query: &str) -> Result<Vec<ImageCandidate>, ImageSearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ImageSearchError::Failed("search down".to_string()));
        }
        Ok(self
            .results
            .iter()
            .map(|url| ImageCandidate { url: url.clone() })
            .collect())
    }
}

fn default_images() -> Vec<String> {
    vec!["https://example.com/default.jpg".to_string()]
}

fn service_with(
    store: &Store,
    generator: Arc<dyn GenerateRecipes>,
    search: Arc<dyn SearchImages>,
) -> DefaultRecipeService {
    let config = CacheConfig::default();
    let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);

    DefaultRecipeService::new(
        store.clone(),
        SimilarityIndex::new(store.clone(), config),
        generator,
        ImageEnricher::new(store.clone(), search, default_images()),
        CacheWriter::new(store.clone(), ids),
    )
}

#[tokio::test]
async fn unsafe_recipe_is_returned_but_not_persisted() {
    let store = test_store().await;

    store
        .upsert_preferences(
            "user-1",
            &UserPreferences {
                allergies: vec!["nuts".to_string()],
                ..UserPreferences::default()
            },
        )
        .await
        .unwrap();

    let generator = FakeGenerator::returning(vec![
        transient_recipe("Chicken Rice Bowl", &["chicken", "rice"]),
        transient_recipe("Walnut Chicken", &["chicken", "walnuts"]),
    ]);
    let search = FakeImageSearch::returning(&["https://example.com/img.jpg"]);
    let service = service_with(&store, generator.clone(), search);

    let outcome = service
        .generate(
            "user-1",
            &["chicken".to_string(), "rice".to_string()],
            "something quick",
        )
        .await
        .unwrap();

    assert!(!outcome.from_cache);
    assert_eq!(outcome.recipes.len(), 2);

    let summary = outcome.validation_summary.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.safe, 1);
    assert_eq!(summary.with_issues, 1);

    let safe = outcome
        .recipes
        .iter()
        .find(|r| r.recipe.name == "Chicken Rice Bowl")
        .unwrap();
    let unsafe_one = outcome
        .recipes
        .iter()
        .find(|r| r.recipe.name == "Walnut Chicken")
        .unwrap();

    // The safe recipe was persisted and carries a permanent-looking id.
    assert!(safe.is_safe);
    assert!(!safe.recipe.recipe_id.is_temporary());
    assert_eq!(safe.recipe.user_id.as_deref(), Some("user-1"));

    // The walnut one is flagged, keeps its temp id, and is not in the store.
    assert!(!unsafe_one.is_safe);
    assert_eq!(unsafe_one.issues.len(), 1);
    assert!(unsafe_one.issues[0].contains("nuts"));
    assert!(unsafe_one.recipe.recipe_id.is_temporary());
    assert!(
        store
            .get_recipe(&unsafe_one.recipe.recipe_id)
            .await
            .unwrap()
            .is_none()
    );

    // Both got an image.
    assert!(safe.recipe.image_url.is_some());
    assert!(unsafe_one.recipe.image_url.is_some());

    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn similar_cached_recipe_short_circuits_generation() {
    let store = test_store().await;

    // Seed a cached recipe for the user: 2 of its 3 ingredients will match
    // the request, similarity 2/3 >= 0.5.
    let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);
    let writer = CacheWriter::new(store.clone(), ids);
    writer
        .persist(
            &transient_recipe("Garlic Chicken Rice", &["chicken", "rice", "garlic"]),
            "user-1",
        )
        .await
        .unwrap();

    let generator = FakeGenerator::returning(vec![transient_recipe("Unused", &["chicken"])]);
    let search = FakeImageSearch::returning(&[]);
    let service = service_with(&store, generator.clone(), search);

    let outcome = service
        .generate("user-1", &["chicken".to_string(), "rice".to_string()], "")
        .await
        .unwrap();

    assert!(outcome.from_cache);
    assert_eq!(outcome.recipes.len(), 1);
    assert_eq!(outcome.recipes[0].recipe.name, "Garlic Chicken Rice");
    assert!(outcome.validation_summary.is_none());

    // No generation call was made.
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn below_threshold_overlap_does_not_short_circuit() {
    let store = test_store().await;

    // Only 1 of 4 ingredients overlaps: similarity 1/4 < 0.5.
    let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);
    let writer = CacheWriter::new(store.clone(), ids);
    writer
        .persist(
            &transient_recipe("Beef Stew", &["beef", "carrot", "potato", "onion"]),
            "user-1",
        )
        .await
        .unwrap();

    let generator = FakeGenerator::returning(vec![transient_recipe("Fresh", &["onion"])]);
    let search = FakeImageSearch::returning(&[]);
    let service = service_with(&store, generator.clone(), search);

    let outcome = service.generate("user-1", &["onion".to_string()], "").await.unwrap();

    assert!(!outcome.from_cache);
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn generation_failure_aborts_the_request() {
    let store = test_store().await;

    let service = service_with(
        &store,
        Arc::new(FailingGenerator),
        FakeImageSearch::returning(&[]),
    );

    let err = service
        .generate("user-1", &["chicken".to_string()], "")
        .await
        .unwrap_err();

    assert!(matches!(err, RecipeError::Generation(_)));
}

#[tokio::test]
async fn enrichment_is_idempotent_once_cached() {
    let store = test_store().await;
    let search = FakeImageSearch::returning(&["https://example.com/a.jpg"]);
    let enricher = ImageEnricher::new(store.clone(), search.clone(), default_images());

    let first = enricher.resolve("Tomato Soup").await;
    let second = enricher.resolve("Tomato Soup").await;

    assert_eq!(first, second);
    // Second lookup was served from the cache; only one external search.
    assert_eq!(search.call_count(), 1);
}

#[tokio::test]
async fn failed_image_search_degrades_to_cached_default() {
    let store = test_store().await;
    let search = FakeImageSearch::failing();
    let enricher = ImageEnricher::new(store.clone(), search.clone(), default_images());

    let url = enricher.resolve("Mystery Dish").await;
    assert_eq!(url, "https://example.com/default.jpg");

    // The fallback was cached too, so the next lookup skips the search.
    let again = enricher.resolve("Mystery Dish").await;
    assert_eq!(again, url);
    assert_eq!(search.call_count(), 1);
}

#[tokio::test]
async fn enrich_batch_resolves_every_distinct_name() {
    let store = test_store().await;
    let search = FakeImageSearch::returning(&["https://example.com/a.jpg"]);
    let enricher = ImageEnricher::new(store.clone(), search, default_images());

    let names: Vec<String> = vec![
        "Soup".to_string(),
        "Stew".to_string(),
        "Curry".to_string(),
        "Soup".to_string(), // duplicate
        "Salad".to_string(),
    ];

    let images = enricher.enrich_batch(&names).await;
    assert_eq!(images.len(), 4);
    assert!(images.values().all(|url| !url.is_empty()));
}

#[tokio::test]
async fn failed_child_insert_rolls_back_the_header() {
    let store = test_store().await;

    // Sabotage the child table so the second phase of the write fails.
    store
        .conn
        .execute_unprepared("DROP TABLE recipe_ingredients")
        .await
        .unwrap();

    let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);
    let writer = CacheWriter::new(store.clone(), ids);

    let recipe = transient_recipe("Doomed Dish", &["chicken"]);
    let err = writer.persist(&recipe, "user-1").await;
    assert!(err.is_err());

    // No headless recipe row was left behind.
    let count = ladle::entities::prelude::Recipes::find()
        .all(&store.conn)
        .await
        .unwrap()
        .len();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn promotion_is_one_way_and_survives_the_purge() {
    let store = test_store().await;

    let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);
    let writer = CacheWriter::new(store.clone(), ids);
    let stored = writer
        .persist(&transient_recipe("Keeper", &["rice"]), "user-1")
        .await
        .unwrap();

    let service = service_with(
        &store,
        FakeGenerator::returning(vec![]),
        FakeImageSearch::returning(&[]),
    );

    let promoted = service.promote("user-1", &stored.recipe_id).await.unwrap();
    assert!(promoted.cache_state.is_permanent());

    // Promoting again conflicts.
    let err = service.promote("user-1", &stored.recipe_id).await.unwrap_err();
    assert!(matches!(err, RecipeError::Conflict(_)));

    // A purge never touches permanent recipes.
    let deleted = service.purge_expired().await.unwrap();
    assert_eq!(deleted, 0);
    assert!(store.get_recipe(&stored.recipe_id).await.unwrap().is_some());
}

#[tokio::test]
async fn promoting_another_users_recipe_is_forbidden() {
    let store = test_store().await;

    let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);
    let writer = CacheWriter::new(store.clone(), ids);
    let stored = writer
        .persist(&transient_recipe("Private", &["rice"]), "owner")
        .await
        .unwrap();

    let service = service_with(
        &store,
        FakeGenerator::returning(vec![]),
        FakeImageSearch::returning(&[]),
    );

    let err = service.promote("intruder", &stored.recipe_id).await.unwrap_err();
    assert!(matches!(err, RecipeError::Forbidden(_)));
}

#[tokio::test]
async fn purge_removes_expired_entries_only() {
    let store = test_store().await;

    let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);
    let writer = CacheWriter::new(store.clone(), ids);

    let mut expired = transient_recipe("Stale", &["rice"]);
    expired.cache_state = CacheState::Cached {
        expires_at: Utc::now() - Duration::hours(1),
    };
    let stale = writer.persist(&expired, "user-1").await.unwrap();

    let fresh = writer
        .persist(&transient_recipe("Fresh", &["rice"]), "user-1")
        .await
        .unwrap();

    let service = service_with(
        &store,
        FakeGenerator::returning(vec![]),
        FakeImageSearch::returning(&[]),
    );

    let deleted = service.purge_expired().await.unwrap();
    assert_eq!(deleted, 1);
    assert!(store.get_recipe(&stale.recipe_id).await.unwrap().is_none());
    assert!(store.get_recipe(&fresh.recipe_id).await.unwrap().is_some());

    // Idempotent: a second sweep removes nothing.
    assert_eq!(service.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn expired_recipes_never_match_similarity_lookup() {
    let store = test_store().await;

    let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);
    let writer = CacheWriter::new(store.clone(), ids);

    let mut expired = transient_recipe("Old Chicken Rice", &["chicken", "rice"]);
    expired.cache_state = CacheState::Cached {
        expires_at: Utc::now() - Duration::hours(1),
    };
    writer.persist(&expired, "user-1").await.unwrap();

    let index = SimilarityIndex::new(store.clone(), CacheConfig::default());
    let matches = index
        .find_similar(
            &["chicken".to_string(), "rice".to_string()],
            Some("user-1"),
        )
        .await
        .unwrap();

    assert!(matches.is_empty());
}

#[tokio::test]
async fn cached_recipes_are_listed_and_readable() {
    let store = test_store().await;

    let ids: Arc<dyn IdAllocator> = Arc::new(UuidAllocator);
    let writer = CacheWriter::new(store.clone(), ids);
    let stored = writer
        .persist(&transient_recipe("Listed", &["rice"]), "user-1")
        .await
        .unwrap();

    let service = service_with(
        &store,
        FakeGenerator::returning(vec![]),
        FakeImageSearch::returning(&[]),
    );

    let cached = service.cached_for_user("user-1").await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].recipe_id, stored.recipe_id);

    // Still-cached entries are readable by other users (shared cache).
    let fetched = service.get_recipe("someone-else", &stored.recipe_id).await;
    assert!(fetched.is_ok());

    let missing = service
        .get_recipe("user-1", &RecipeId::new("does-not-exist"))
        .await
        .unwrap_err();
    assert!(matches!(missing, RecipeError::NotFound(_)));
}
