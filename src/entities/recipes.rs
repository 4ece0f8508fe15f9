use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub cooking_time: i32,
    pub servings: i32,
    pub difficulty: String,
    pub model_version: Option<String>,
    pub image_url: Option<String>,
    pub is_cached: bool,
    /// RFC3339; present only while `is_cached` is true.
    pub cached_until: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_ingredients::Entity")]
    RecipeIngredients,
    #[sea_orm(has_many = "super::recipe_steps::Entity")]
    RecipeSteps,
}

impl Related<super::recipe_ingredients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredients.def()
    }
}

impl Related<super::recipe_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeSteps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
