use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// JSON arrays of strings.
    #[sea_orm(column_type = "Text")]
    pub dietary_restrictions: String,
    #[sea_orm(column_type = "Text")]
    pub banned_ingredients: String,
    #[sea_orm(column_type = "Text")]
    pub favorite_ingredients: String,
    #[sea_orm(column_type = "Text")]
    pub allergies: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
