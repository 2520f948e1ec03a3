//! Customer profile types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use cafe_amka_core::{MenuItemId, UserId};

/// Which notifications the customer wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub order_updates: bool,
    pub loyalty_updates: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            order_updates: true,
            loyalty_updates: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub dietary_preferences: Vec<String>,
    pub favorite_items: Vec<MenuItemId>,
    pub notifications: NotificationPreferences,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub dietary_preferences: Option<Vec<String>>,
    pub favorite_items: Option<Vec<MenuItemId>>,
    pub notifications: Option<NotificationPreferences>,
}
