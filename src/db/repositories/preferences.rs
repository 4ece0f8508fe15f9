use anyhow::Result;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::entities::{prelude::*, user_preferences};
use crate::models::UserPreferences as Preferences;

pub struct PreferencesRepository {
    conn: DatabaseConnection,
}

impl PreferencesRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Preference snapshot for a user; users without a stored profile get
    /// empty sets.
    pub async fn get(&self, user_id: &str) -> Result<Preferences> {
        let row = UserPreferences::find_by_id(user_id).one(&self.conn).await?;

        Ok(row.map_or_else(Preferences::default, |m| Preferences {
            dietary_restrictions: serde_json::from_str(&m.dietary_restrictions)
                .unwrap_or_default(),
            banned_ingredients: serde_json::from_str(&m.banned_ingredients).unwrap_or_default(),
            favorite_ingredients: serde_json::from_str(&m.favorite_ingredients)
                .unwrap_or_default(),
            allergies: serde_json::from_str(&m.allergies).unwrap_or_default(),
        }))
    }

    pub async fn upsert(&self, user_id: &str, prefs: &Preferences) -> Result<()> {
        let model = user_preferences::ActiveModel {
            user_id: Set(user_id.to_string()),
            dietary_restrictions: Set(serde_json::to_string(&prefs.dietary_restrictions)?),
            banned_ingredients: Set(serde_json::to_string(&prefs.banned_ingredients)?),
            favorite_ingredients: Set(serde_json::to_string(&prefs.favorite_ingredients)?),
            allergies: Set(serde_json::to_string(&prefs.allergies)?),
            updated_at: Set(Utc::now().to_rfc3339()),
        };

        UserPreferences::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(user_preferences::Column::UserId)
                    .update_columns([
                        user_preferences::Column::DietaryRestrictions,
                        user_preferences::Column::BannedIngredients,
                        user_preferences::Column::FavoriteIngredients,
                        user_preferences::Column::Allergies,
                        user_preferences::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }
}
