//! Cart route handlers.
//!
//! The cart lives in the session under [`session_keys::CART`]. Every mutation
//! loads it, applies the change through [`Cart`] and writes it back, so the
//! derived totals are always recomputed server-side.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{instrument, warn};

use cafe_amka_core::{
    Cart, CartLineItem, Customizations, LineKey, MenuItemId, Money, OrderSummary, OrderType,
};

use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session.
///
/// A cart that no longer deserializes is dropped and an empty one returned.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => Ok(cart.unwrap_or_default()),
        Err(tower_sessions::session::Error::SerdeJson(e)) => {
            warn!(error = %e, "Discarding unreadable cart");
            session.remove_value(session_keys::CART).await?;
            Ok(Cart::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Write the cart back to the session.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub menu_item_id: MenuItemId,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub customizations: Customizations,
    pub special_instructions: Option<String>,
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i64,
}

/// Order type used for the summary preview.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    pub order_type: Option<OrderType>,
}

/// The cart with its derived figures.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub total_items: u32,
    pub total_amount: Money,
    /// Fees and total for the requested (or default) order type.
    pub summary: OrderSummary,
}

impl CartView {
    fn new(cart: Cart, order_type: OrderType, state: &AppState) -> Self {
        let summary = OrderSummary::calculate(&cart, order_type, &state.config().pricing);
        Self {
            total_items: cart.total_items(),
            total_amount: cart.total_amount(),
            items: cart.items().to_vec(),
            summary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/cart
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::new(
        cart,
        query.order_type.unwrap_or_default(),
        &state,
    )))
}

/// POST /api/cart/items
///
/// Adds a configured menu item. The same configuration added twice grows
/// the existing line.
#[instrument(skip(state, session, body), fields(menu_item_id = %body.menu_item_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartView>> {
    let item = state.menu().item(body.menu_item_id).await?;

    let mut cart = load_cart(&session).await?;
    cart.add(
        &item,
        body.quantity.unwrap_or(1),
        body.customizations,
        body.special_instructions.as_deref(),
    )?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::new(cart, OrderType::default(), &state)))
}

/// PATCH /api/cart/items/{key}
///
/// A quantity of zero or less removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.update_quantity(&LineKey::from(key), body.quantity)?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::new(cart, OrderType::default(), &state)))
}

/// DELETE /api/cart/items/{key}
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if !cart.remove(&LineKey::from(key)) {
        return Err(AppError::NotFound("cart line".to_owned()));
    }
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::new(cart, OrderType::default(), &state)))
}

/// DELETE /api/cart
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    session.remove_value(session_keys::CART).await?;
    Ok(Json(CartView::new(Cart::new(), OrderType::default(), &state)))
}

/// GET /api/cart/count
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartCount {
        count: cart.total_items(),
    }))
}
