use serde::Serialize;

use crate::models::Recipe;

/// Verdict of checking one recipe against allergies and banned
/// ingredients. Computed fresh on every pass; preferences can change
/// between requests, so this is never cached.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_safe: bool,
    pub issues: Vec<String>,
}

fn term_violated(term: &str, ingredients: &[String]) -> Option<String> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return None;
    }
    ingredients
        .iter()
        .find(|ing| ing.contains(&term) || term.contains(ing.as_str()))
        .cloned()
}

/// Checks every ingredient name against each allergy and banned term with
/// the same lenient, case-insensitive substring matching the similarity
/// index uses. One issue per violated term.
#[must_use]
pub fn validate_recipe(recipe: &Recipe, allergies: &[String], banned: &[String]) -> ValidationResult {
    let ingredients: Vec<String> = recipe
        .ingredients
        .iter()
        .map(|i| i.name.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();

    let mut issues = Vec::new();

    for term in allergies {
        if let Some(ingredient) = term_violated(term, &ingredients) {
            issues.push(format!(
                "contains '{ingredient}', which conflicts with the allergy '{}'",
                term.trim()
            ));
        }
    }

    for term in banned {
        if let Some(ingredient) = term_violated(term, &ingredients) {
            issues.push(format!(
                "contains '{ingredient}', which is a banned ingredient ('{}')",
                term.trim()
            ));
        }
    }

    ValidationResult {
        is_safe: issues.is_empty(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CacheState, RecipeIngredient};
    use chrono::Utc;

    fn recipe_with(names: &[&str]) -> Recipe {
        Recipe {
            recipe_id: "r1".into(),
            user_id: None,
            name: "Test".to_string(),
            description: None,
            steps: vec![],
            ingredients: names
                .iter()
                .map(|n| RecipeIngredient {
                    name: (*n).to_string(),
                    quantity: 1.0,
                    unit: "unit".to_string(),
                    optional: false,
                    notes: None,
                })
                .collect(),
            cooking_time: 10,
            servings: 2,
            difficulty: "easy".to_string(),
            model_version: None,
            image_url: None,
            cache_state: CacheState::Permanent,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn allergy_substring_flags_recipe() {
        let recipe = recipe_with(&["peanut butter", "bread"]);
        let result = validate_recipe(&recipe, &["peanut".to_string()], &[]);

        assert!(!result.is_safe);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].contains("peanut"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let recipe = recipe_with(&["Walnuts"]);
        let result = validate_recipe(&recipe, &["nuts".to_string()], &[]);
        assert!(!result.is_safe);
    }

    #[test]
    fn banned_terms_produce_their_own_issue() {
        let recipe = recipe_with(&["pork belly", "peanut butter"]);
        let result = validate_recipe(&recipe, &["peanut".to_string()], &["pork".to_string()]);

        assert!(!result.is_safe);
        assert_eq!(result.issues.len(), 2);
        assert!(result.issues[0].contains("allergy"));
        assert!(result.issues[1].contains("banned"));
    }

    #[test]
    fn clean_recipe_is_safe() {
        let recipe = recipe_with(&["chicken", "rice"]);
        let result = validate_recipe(&recipe, &["peanut".to_string()], &["pork".to_string()]);

        assert!(result.is_safe);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn one_issue_per_violated_term() {
        // Two ingredients hit the same allergy term; still one issue.
        let recipe = recipe_with(&["peanut butter", "peanut oil"]);
        let result = validate_recipe(&recipe, &["peanut".to_string()], &[]);
        assert_eq!(result.issues.len(), 1);
    }
}
