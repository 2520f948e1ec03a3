//! Menu route handlers.
//!
//! All reads go through the cached [`MenuCatalog`](crate::services::MenuCatalog).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use cafe_amka_core::{CategoryId, MenuItem, MenuItemId};

use crate::error::Result;
use crate::services::Menu;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    pub limit: Option<i64>,
}

/// GET /api/menu
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Menu>> {
    let menu = state.menu().menu().await?;
    Ok(Json(Menu::clone(&menu)))
}

/// GET /api/menu/featured
#[instrument(skip(state))]
pub async fn featured(
    State(state): State<AppState>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<Vec<MenuItem>>> {
    let items = state.menu().featured(query.limit).await?;
    Ok(Json(items.to_vec()))
}

/// GET /api/menu/categories/{id}
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Vec<MenuItem>>> {
    let items = state.menu().category(id).await?;
    Ok(Json(items.to_vec()))
}

/// GET /api/menu/items/{id}
#[instrument(skip(state))]
pub async fn item(
    State(state): State<AppState>,
    Path(id): Path<MenuItemId>,
) -> Result<Json<MenuItem>> {
    Ok(Json(state.menu().item(id).await?))
}
