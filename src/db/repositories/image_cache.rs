use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::{image_cache, prelude::*};

#[derive(Debug, Clone)]
pub struct CachedImage {
    pub image_url: String,
    pub source: String,
}

pub struct ImageCacheRepository {
    conn: DatabaseConnection,
}

impl ImageCacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, name_hash: &str) -> Result<Option<CachedImage>> {
        let row = ImageCache::find_by_id(name_hash).one(&self.conn).await?;

        Ok(row.map(|m| CachedImage {
            image_url: m.image_url,
            source: m.source,
        }))
    }

    /// Upsert by name hash; the cache is shared across users, last write
    /// wins.
    pub async fn upsert(&self, name_hash: &str, image_url: &str, source: &str) -> Result<()> {
        let model = image_cache::ActiveModel {
            name_hash: Set(name_hash.to_string()),
            image_url: Set(image_url.to_string()),
            source: Set(source.to_string()),
            created_at: Set(Utc::now().to_rfc3339()),
        };

        ImageCache::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(image_cache::Column::NameHash)
                    .update_columns([
                        image_cache::Column::ImageUrl,
                        image_cache::Column::Source,
                        image_cache::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    /// Age-based bulk deletion; returns the number of rows removed.
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = ImageCache::delete_many()
            .filter(image_cache::Column::CreatedAt.lt(cutoff.to_rfc3339()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
