pub use super::image_cache::Entity as ImageCache;
pub use super::recipe_ingredients::Entity as RecipeIngredients;
pub use super::recipe_steps::Entity as RecipeSteps;
pub use super::recipes::Entity as Recipes;
pub use super::user_preferences::Entity as UserPreferences;
