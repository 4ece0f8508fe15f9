use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::constants::limits::UNSPLASH_PER_PAGE;

#[derive(Debug, Error)]
pub enum ImageSearchError {
    /// No access key configured. The enrichment pipeline treats this the
    /// same as an empty result and falls back to the default rotation.
    #[error("image search is not configured")]
    Misconfigured,

    #[error("image search failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ImageCandidate {
    pub url: String,
}

/// Capability to find candidate images for a query string.
#[async_trait::async_trait]
pub trait SearchImages: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ImageCandidate>, ImageSearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[derive(Clone)]
pub struct UnsplashClient {
    client: Client,
    base_url: String,
    access_key: Option<String>,
}

impl UnsplashClient {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, access_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            access_key: access_key.filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait::async_trait]
impl SearchImages for UnsplashClient {
    async fn search(&self, query: &str) -> Result<Vec<ImageCandidate>, ImageSearchError> {
        let Some(access_key) = &self.access_key else {
            return Err(ImageSearchError::Misconfigured);
        };

        let url = format!(
            "{}/search/photos?query={}&per_page={}&orientation=landscape",
            self.base_url,
            urlencoding::encode(query),
            UNSPLASH_PER_PAGE,
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Client-ID {access_key}"))
            .send()
            .await
            .map_err(|e| ImageSearchError::Failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageSearchError::Failed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| ImageSearchError::Failed(e.to_string()))?;

        Ok(payload
            .results
            .into_iter()
            .map(|p| ImageCandidate {
                url: p.urls.regular,
            })
            .collect())
    }
}
