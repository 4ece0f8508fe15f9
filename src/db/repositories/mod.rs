pub mod image_cache;
pub mod preferences;
pub mod recipe;
