//! Order route handlers. All require a signed-in customer.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use cafe_amka_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderDetail};
use crate::services::OrderService;
use crate::state::AppState;

fn service(state: &AppState) -> OrderService<'_> {
    OrderService::new(state.pool(), state.gate(), state.payments())
}

/// GET /api/orders
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(service(&state).history(&user).await?))
}

/// GET /api/orders/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    Ok(Json(service(&state).detail(&user, id).await?))
}

/// POST /api/orders/{id}/cancel
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(service(&state).cancel(&user, id).await?))
}
