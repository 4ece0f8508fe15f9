pub mod cache_writer;
pub use cache_writer::CacheWriter;

pub mod enrichment;
pub use enrichment::ImageEnricher;

pub mod prompt;

pub mod recipe_service;
pub use recipe_service::{
    GenerationOutcome, RecipeError, RecipeService, ValidatedRecipe, ValidationSummary,
};

pub mod recipe_service_impl;
pub use recipe_service_impl::DefaultRecipeService;

pub mod similarity;
pub use similarity::SimilarityIndex;

pub mod validation;
pub use validation::{ValidationResult, validate_recipe};
