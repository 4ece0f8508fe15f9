use crate::models::UserPreferences;

/// Appends the preference constraints to a free-text prompt before it is
/// sent to the generation service.
///
/// Clause order is fixed: favorites, then allergies, then dietary
/// restrictions, then banned ingredients. Generation systems weight later
/// clauses more heavily, and the allergy clause is phrased as a hard
/// constraint so avoidance dominates.
///
/// Not idempotent: calling it twice keeps appending. The orchestrator calls
/// it exactly once per request.
#[must_use]
pub fn optimize_prompt(base_prompt: &str, prefs: &UserPreferences) -> String {
    let mut prompt = base_prompt.to_string();

    if !prefs.favorite_ingredients.is_empty() {
        prompt.push_str(&format!(
            " Try to feature these favorite ingredients: {}.",
            prefs.favorite_ingredients.join(", ")
        ));
    }

    if !prefs.allergies.is_empty() {
        prompt.push_str(&format!(
            " The recipes must not include {} under any circumstance, the user is allergic.",
            prefs.allergies.join(", ")
        ));
    }

    if !prefs.dietary_restrictions.is_empty() {
        prompt.push_str(&format!(
            " Follow these dietary restrictions: {}.",
            prefs.dietary_restrictions.join(", ")
        ));
    }

    if !prefs.banned_ingredients.is_empty() {
        prompt.push_str(&format!(
            " Never use these ingredients: {}.",
            prefs.banned_ingredients.join(", ")
        ));
    }

    prompt.trim_end().to_string()
}
