//! Profile route handlers. All require a signed-in customer.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use cafe_amka_core::Phone;

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Profile, ProfileUpdate};
use crate::state::AppState;

/// Normalise the free-text fields of an update before it is stored.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a malformed phone number.
fn normalise(mut update: ProfileUpdate) -> Result<ProfileUpdate> {
    if let Some(phone) = update.phone.take() {
        let phone = Phone::parse(&phone).map_err(|e| AppError::BadRequest(e.to_string()))?;
        update.phone = Some(phone.as_str().to_owned());
    }

    for name in [&mut update.first_name, &mut update.last_name] {
        if let Some(value) = name.as_mut() {
            *value = value.trim().to_owned();
        }
    }

    Ok(update)
}

/// GET /api/profile
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    ProfileRepository::new(state.pool())
        .get(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("profile".to_owned()))
}

/// PUT /api/profile
///
/// Absent fields keep their stored value.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let update = normalise(body)?;
    let profile = ProfileRepository::new(state.pool())
        .update(user.id, &update)
        .await?;

    info!("Profile updated");
    Ok(Json(profile))
}
