//! Cookie sessions stored in `PostgreSQL`.
//!
//! A session holds the signed-in customer, the cart and any delivery details
//! saved during checkout, so anonymous carts survive until sign-in.

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::CafeConfig;

pub const SESSION_COOKIE_NAME: &str = "cafe_session";

/// Build the session layer on top of the shared pool.
///
/// Expiry slides with activity. The `tower_sessions.session` table comes from
/// the initial migration, so nothing is created here.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &CafeConfig,
) -> SessionManagerLayer<PostgresStore> {
    let idle = time::Duration::try_from(config.session_idle).unwrap_or(time::Duration::WEEK);

    SessionManagerLayer::new(PostgresStore::new(pool.clone()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(idle))
        .with_secure(config.is_https())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
