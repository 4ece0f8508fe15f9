use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Recipes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(RecipeIngredients)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(RecipeSteps)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ImageCache)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserPreferences)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_recipes_user_cached")
                    .table(RecipesIden::Table)
                    .col(RecipesIden::UserId)
                    .col(RecipesIden::IsCached)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_recipe_ingredients_recipe")
                    .table(RecipeIngredientsIden::Table)
                    .col(RecipeIngredientsIden::RecipeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_recipe_steps_recipe")
                    .table(RecipeStepsIden::Table)
                    .col(RecipeStepsIden::RecipeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserPreferences).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ImageCache).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeSteps).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeIngredients).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum RecipesIden {
    #[sea_orm(iden = "recipes")]
    Table,
    UserId,
    IsCached,
}

#[derive(DeriveIden)]
enum RecipeIngredientsIden {
    #[sea_orm(iden = "recipe_ingredients")]
    Table,
    RecipeId,
}

#[derive(DeriveIden)]
enum RecipeStepsIden {
    #[sea_orm(iden = "recipe_steps")]
    Table,
    RecipeId,
}
