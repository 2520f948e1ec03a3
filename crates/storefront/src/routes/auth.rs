//! Authentication route handlers.
//!
//! Email and password accounts. A successful registration or login stores
//! the customer in the session; the anonymous cart carries over.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthService, NewAccount};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Checked against `password` when present.
    pub password_confirm: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

async fn sign_in(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /auth/register
///
/// Creates the account with an empty profile and wallet, then signs in.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register_with_password(&NewAccount {
            email: &body.email,
            password: &body.password,
            password_confirm: body.password_confirm.as_deref(),
            first_name: body.first_name.as_deref(),
            last_name: body.last_name.as_deref(),
        })
        .await?;

    sign_in(&session, &user).await?;
    info!(user_id = %user.id, "Customer registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login_with_password(&body.email, &body.password)
        .await
        .inspect_err(|e| warn!(error = %e, "Login failed"))?;

    sign_in(&session, &user).await?;
    info!(user_id = %user.id, "Customer signed in");

    Ok(Json(user))
}

/// POST /auth/logout
///
/// Drops the whole session, cart included.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    Ok(Json(AuthService::new(state.pool()).get_user(user.id).await?))
}
