pub mod preferences;
pub mod recipe;

pub use preferences::UserPreferences;
pub use recipe::{CacheState, Recipe, RecipeIngredient, RecipeStep};
