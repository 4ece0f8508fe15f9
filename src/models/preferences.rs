use serde::{Deserialize, Serialize};

/// Read-only snapshot of a user's dietary profile.
///
/// Taken once at the start of a generation request and never mutated during
/// it; profile updates happen through the preferences endpoint between
/// requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub dietary_restrictions: Vec<String>,
    pub banned_ingredients: Vec<String>,
    pub favorite_ingredients: Vec<String>,
    pub allergies: Vec<String>,
}

impl UserPreferences {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dietary_restrictions.is_empty()
            && self.banned_ingredients.is_empty()
            && self.favorite_ingredients.is_empty()
            && self.allergies.is_empty()
    }
}
