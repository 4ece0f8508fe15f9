pub mod prelude;

pub mod image_cache;
pub mod recipe_ingredients;
pub mod recipe_steps;
pub mod recipes;
pub mod user_preferences;
