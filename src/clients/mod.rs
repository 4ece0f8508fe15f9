pub mod generator;
pub mod unsplash;
