//! Customer accounts. `User` carries no password hash, so it is safe to return as JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cafe_amka_core::{Email, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
