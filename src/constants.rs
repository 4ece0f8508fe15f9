pub mod cache {

    pub const RECIPE_TTL_HOURS: i64 = 48;

    pub const IMAGE_MAX_AGE_DAYS: i64 = 30;

    pub const SIMILARITY_THRESHOLD: f64 = 0.5;

    pub const MAX_SIMILAR_MATCHES: usize = 5;
}

pub mod enrichment {
    use std::time::Duration;

    pub const BATCH_SIZE: usize = 3;

    pub const BATCH_PAUSE: Duration = Duration::from_millis(100);

    pub const QUERY_KEYWORD_LIMIT: usize = 3;

    /// Words carrying no signal for an image search, stripped before the
    /// query is built from a recipe name.
    pub const STOP_WORDS: &[&str] = &[
        "with", "and", "the", "of", "in", "a", "an", "on", "style", "homemade", "easy", "quick",
        "classic", "special", "supreme",
    ];

    /// Fallback rotation used when the image search is unavailable or
    /// returns nothing.
    pub const DEFAULT_IMAGES: &[&str] = &[
        "https://images.unsplash.com/photo-1565299624946-b28f40a0ca4b?w=800&h=600&fit=crop",
        "https://images.unsplash.com/photo-1567620905732-2d1ec7ab7445?w=800&h=600&fit=crop",
        "https://images.unsplash.com/photo-1546069901-ba9599a7e63c?w=800&h=600&fit=crop",
        "https://images.unsplash.com/photo-1555939594-58d7cb561ad1?w=800&h=600&fit=crop",
        "https://images.unsplash.com/photo-1565958011703-44f9829ba187?w=800&h=600&fit=crop",
    ];
}

pub mod limits {

    pub const MAX_REQUEST_INGREDIENTS: usize = 30;

    pub const UNSPLASH_PER_PAGE: u32 = 5;

    pub const UNSPLASH_PICK_POOL: usize = 3;
}
