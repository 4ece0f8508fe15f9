use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::clients::unsplash::{ImageSearchError, SearchImages};
use crate::constants::enrichment::{BATCH_PAUSE, BATCH_SIZE, QUERY_KEYWORD_LIMIT, STOP_WORDS};
use crate::constants::limits::UNSPLASH_PICK_POOL;
use crate::db::Store;

const SOURCE_UNSPLASH: &str = "unsplash";
const SOURCE_DEFAULT: &str = "default";

/// Cache key for a recipe name: sha256 hex of the trimmed, lowercased
/// form, so "Tomato Soup" and " tomato soup " share an entry.
#[must_use]
pub fn name_hash(recipe_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(recipe_name.trim().to_lowercase());
    format!("{:x}", hasher.finalize())
}

/// Derives a short image-search query from a recipe name: strip stop words
/// and short tokens, keep the first three remaining, suffix a food hint so
/// generic names still return dishes.
#[must_use]
pub fn search_query(recipe_name: &str) -> String {
    let keywords: Vec<&str> = recipe_name
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| w.len() > 2)
        .filter(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .take(QUERY_KEYWORD_LIMIT)
        .collect();

    format!("{} food recipe", keywords.join(" "))
        .trim()
        .to_string()
}

fn pick_default_image(recipe_name: &str, defaults: &[String]) -> String {
    use rand::Rng;

    if defaults.is_empty() {
        return String::new();
    }
    let index = rand::rng().random_range(0..defaults.len());
    debug!(name = %recipe_name, "using default image fallback");
    defaults[index].clone()
}

/// Resolves a representative image per recipe name: cache, then external
/// search, then a fixed default rotation. Results are written back to the
/// cache so repeated lookups stay stable.
pub struct ImageEnricher {
    store: Store,
    search: Arc<dyn SearchImages>,
    default_images: Vec<String>,
}

impl ImageEnricher {
    #[must_use]
    pub const fn new(store: Store, search: Arc<dyn SearchImages>, default_images: Vec<String>) -> Self {
        Self {
            store,
            search,
            default_images,
        }
    }

    /// Image URL for one recipe name. Never fails: every error path
    /// degrades to the default rotation.
    pub async fn resolve(&self, recipe_name: &str) -> String {
        let hash = name_hash(recipe_name);

        match self.store.get_cached_image(&hash).await {
            Ok(Some(cached)) => {
                metrics::counter!("image_cache_hits_total").increment(1);
                return cached.image_url;
            }
            Ok(None) => {}
            Err(e) => warn!(name = %recipe_name, "image cache lookup failed: {e}"),
        }
        metrics::counter!("image_cache_misses_total").increment(1);

        let query = search_query(recipe_name);

        let (url, source) = match self.search.search(&query).await {
            Ok(candidates) if !candidates.is_empty() => {
                use rand::Rng;

                // Random pick among the top few for variety across recipes
                // that share a query.
                let pool = candidates.len().min(UNSPLASH_PICK_POOL);
                let index = rand::rng().random_range(0..pool);
                (candidates[index].url.clone(), SOURCE_UNSPLASH)
            }
            Ok(_) => (
                pick_default_image(recipe_name, &self.default_images),
                SOURCE_DEFAULT,
            ),
            Err(ImageSearchError::Misconfigured) => (
                pick_default_image(recipe_name, &self.default_images),
                SOURCE_DEFAULT,
            ),
            Err(e) => {
                warn!(name = %recipe_name, "image search failed: {e}");
                metrics::counter!("image_search_failures_total").increment(1);
                (
                    pick_default_image(recipe_name, &self.default_images),
                    SOURCE_DEFAULT,
                )
            }
        };

        // Cache the fallback too, so the same name keeps the same image.
        if let Err(e) = self.store.cache_image(&hash, &url, source).await {
            warn!(name = %recipe_name, "failed to cache image: {e}");
        }

        url
    }

    /// Resolves a batch of recipe names to image URLs. Names are processed
    /// in fixed-size parallel batches with a short pause in between to
    /// respect external rate limits. A failure for one name degrades to
    /// the default image for that name only.
    pub async fn enrich_batch(&self, recipe_names: &[String]) -> HashMap<String, String> {
        let mut distinct: Vec<&String> = Vec::new();
        for name in recipe_names {
            if !distinct.contains(&name) {
                distinct.push(name);
            }
        }

        let mut images = HashMap::with_capacity(distinct.len());
        let mut batches = distinct.chunks(BATCH_SIZE).peekable();

        while let Some(batch) = batches.next() {
            let lookups = batch.iter().map(|name| async move {
                let url = self.resolve(name).await;
                ((*name).clone(), url)
            });

            for (name, url) in futures::future::join_all(lookups).await {
                images.insert(name, url);
            }

            if batches.peek().is_some() {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
        }

        images
    }
}
