//! Wallet route handlers. All require a signed-in customer.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use cafe_amka_core::{Money, PaymentMethod, Reward};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Transaction;
use crate::services::{Redemption, WalletOverview, WalletService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TopUp {
    pub amount: Money,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct Redeem {
    pub reward: Reward,
}

/// GET /api/wallet
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<WalletOverview>> {
    let wallet = WalletService::new(state.pool(), state.payments())
        .overview(&user)
        .await?;
    Ok(Json(wallet))
}

/// GET /api/wallet/transactions
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn transactions(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Transaction>>> {
    let rows = WalletService::new(state.pool(), state.payments())
        .transactions(&user)
        .await?;
    Ok(Json(rows))
}

/// POST /api/wallet/top-up
#[instrument(skip(state, user, body), fields(user_id = %user.id, method = %body.payment_method))]
pub async fn top_up(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<TopUp>,
) -> Result<Json<WalletOverview>> {
    let wallet = WalletService::new(state.pool(), state.payments())
        .top_up(&user, body.amount, body.payment_method)
        .await?;
    Ok(Json(wallet))
}

/// POST /api/wallet/redeem
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn redeem(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<Redeem>,
) -> Result<Json<Redemption>> {
    let redemption = WalletService::new(state.pool(), state.payments())
        .redeem(&user, body.reward)
        .await?;
    Ok(Json(redemption))
}
