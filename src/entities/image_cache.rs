use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "image_cache")]
pub struct Model {
    /// Sha256 hex of the trimmed, lowercased recipe name.
    #[sea_orm(primary_key, auto_increment = false)]
    pub name_hash: String,
    pub image_url: String,
    /// "unsplash" or "default".
    pub source: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
