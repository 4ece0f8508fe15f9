use anyhow::Result;
use tracing::debug;

use crate::config::CacheConfig;
use crate::db::Store;
use crate::models::Recipe;

/// Finds unexpired cached recipes whose ingredient lists overlap the
/// requested set closely enough to reuse instead of generating.
pub struct SimilarityIndex {
    store: Store,
    config: CacheConfig,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Lenient ingredient match: either normalized name contains the other.
/// Recipe phrasing varies ("tomato" vs "ripe tomatoes"), so exact equality
/// would miss most genuine overlaps.
fn lenient_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}

/// Number of requested ingredients with a lenient match against any of the
/// recipe's ingredient names. Both sides pre-normalized.
fn matched_count(requested: &[String], recipe_ingredients: &[String]) -> usize {
    requested
        .iter()
        .filter(|req| recipe_ingredients.iter().any(|ing| lenient_match(req, ing)))
        .count()
}

/// Overlap ratio against the larger of the two sets, so a tiny recipe
/// matching one of ten requested ingredients does not score high.
fn similarity(matched: usize, requested_len: usize, recipe_len: usize) -> f64 {
    let denom = requested_len.max(recipe_len);
    if denom == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        matched as f64 / denom as f64
    }
}

/// Pairs a candidate with its match stats for one ranking pass. Derived,
/// never stored.
struct SimilarityMatch {
    recipe: Recipe,
    matched: usize,
}

impl SimilarityIndex {
    #[must_use]
    pub const fn new(store: Store, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Best-first list of reusable recipes, empty when nothing clears the
    /// threshold. Absence of matches is a normal result, not an error.
    pub async fn find_similar(
        &self,
        requested: &[String],
        owner: Option<&str>,
    ) -> Result<Vec<Recipe>> {
        self.find_similar_with_threshold(requested, owner, self.config.similarity_threshold)
            .await
    }

    pub async fn find_similar_with_threshold(
        &self,
        requested: &[String],
        owner: Option<&str>,
        threshold: f64,
    ) -> Result<Vec<Recipe>> {
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let requested: Vec<String> = requested.iter().map(|s| normalize(s)).collect();
        let candidates = self.store.unexpired_recipes(owner).await?;

        let mut matches: Vec<SimilarityMatch> = candidates
            .into_iter()
            .filter_map(|recipe| {
                // A cached recipe with no ingredients can never match.
                if recipe.ingredients.is_empty() {
                    return None;
                }

                let names: Vec<String> = recipe
                    .ingredients
                    .iter()
                    .map(|i| normalize(&i.name))
                    .collect();

                let matched = matched_count(&requested, &names);
                let score = similarity(matched, requested.len(), names.len());

                (score >= threshold).then_some(SimilarityMatch { recipe, matched })
            })
            .collect();

        matches.sort_by(|a, b| b.matched.cmp(&a.matched));
        matches.truncate(self.config.max_matches);

        debug!(
            requested = requested.len(),
            found = matches.len(),
            "similarity lookup complete"
        );

        Ok(matches.into_iter().map(|m| m.recipe).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_match_is_bidirectional() {
        assert!(lenient_match("tomato", "ripe tomatoes"));
        assert!(lenient_match("ripe tomatoes", "tomato"));
        assert!(!lenient_match("tomato", "chicken"));
    }

    #[test]
    fn empty_names_never_match() {
        assert!(!lenient_match("", "tomato"));
        assert!(!lenient_match("tomato", ""));
    }

    #[test]
    fn matched_count_counts_requested_side() {
        let requested = vec!["chicken".to_string(), "rice".to_string()];
        let recipe = vec![
            "chicken breast".to_string(),
            "white rice".to_string(),
            "garlic".to_string(),
        ];
        assert_eq!(matched_count(&requested, &recipe), 2);
    }

    #[test]
    fn similarity_uses_larger_set_as_denominator() {
        // 2 matched, request of 2, recipe of 3 -> 2/3
        let score = similarity(2, 2, 3);
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
        assert!(score >= 0.5);
    }

    #[test]
    fn similarity_of_empty_sets_is_zero() {
        assert!(similarity(0, 0, 0).abs() < f64::EPSILON);
    }
}
