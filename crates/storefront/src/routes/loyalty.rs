//! Loyalty overview handler.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{LoyaltyOverview, WalletService};
use crate::state::AppState;

/// GET /api/loyalty
///
/// Points, tier progress, lifetime order totals and the latest activity.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<LoyaltyOverview>> {
    let overview = WalletService::new(state.pool(), state.payments())
        .loyalty(&user)
        .await?;
    Ok(Json(overview))
}
