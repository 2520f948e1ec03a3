//! Profile repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use cafe_amka_core::{MenuItemId, UserId};

use super::RepositoryError;
use crate::models::{NotificationPreferences, Profile, ProfileUpdate};

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: UserId,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    date_of_birth: Option<NaiveDate>,
    dietary_preferences: Vec<String>,
    favorite_items: serde_json::Value,
    order_updates: bool,
    loyalty_updates: bool,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let favorite_items: Vec<MenuItemId> = serde_json::from_value(row.favorite_items)
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid favorite items for user {}: {e}",
                    row.user_id
                ))
            })?;

        Ok(Self {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            address: row.address,
            date_of_birth: row.date_of_birth,
            dietary_preferences: row.dietary_preferences,
            favorite_items,
            notifications: NotificationPreferences {
                order_updates: row.order_updates,
                loyalty_updates: row.loyalty_updates,
            },
            is_active: row.is_active,
            updated_at: row.updated_at,
        })
    }
}

const PROFILE_COLUMNS: &str = r"
    user_id, first_name, last_name, phone, address, date_of_birth,
    dietary_preferences, favorite_items, order_updates, loyalty_updates,
    is_active, updated_at
";

/// Repository for customer profiles.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the profile for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");

        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    /// Apply a partial update. Fields left as `None` keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no profile.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let sql = format!(
            r"
            UPDATE profiles SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                date_of_birth = COALESCE($6, date_of_birth),
                dietary_preferences = COALESCE($7, dietary_preferences),
                favorite_items = COALESCE($8, favorite_items),
                order_updates = COALESCE($9, order_updates),
                loyalty_updates = COALESCE($10, loyalty_updates),
                updated_at = now()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        );

        let notifications = update.notifications;

        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .bind(update.first_name.as_deref())
            .bind(update.last_name.as_deref())
            .bind(update.phone.as_deref())
            .bind(update.address.as_deref())
            .bind(update.date_of_birth)
            .bind(update.dietary_preferences.as_deref())
            .bind(update.favorite_items.as_deref().map(Json))
            .bind(notifications.map(|n| n.order_updates))
            .bind(notifications.map(|n| n.loyalty_updates))
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
            .and_then(Profile::try_from)
    }
}
