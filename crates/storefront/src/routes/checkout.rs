//! Checkout route handlers.
//!
//! Delivery details are kept in the session between the delivery form and
//! order placement. Placing an order runs the checkout gate, charges the
//! chosen method and persists the order; the session cart is cleared only
//! after all of that succeeds.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use cafe_amka_core::{DeliveryDetails, OrderSummary, OrderType, PaymentMethod};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::{OrderDetail, session_keys};
use crate::routes::cart::{PreviewQuery, load_cart};
use crate::services::{CheckoutChoice, OrderService};
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct PlaceOrder {
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub terms_accepted: bool,
    /// Overrides the delivery details saved in the session.
    pub delivery: Option<DeliveryDetails>,
}

/// Read saved delivery details, if any.
async fn load_delivery(session: &Session) -> Result<Option<DeliveryDetails>> {
    Ok(session
        .get::<DeliveryDetails>(session_keys::DELIVERY_DETAILS)
        .await?)
}

/// PUT /api/checkout/delivery
///
/// Stores the details as given. They are validated when the order is placed.
#[instrument(skip(session, details))]
pub async fn save_delivery(
    session: Session,
    Json(details): Json<DeliveryDetails>,
) -> Result<Json<DeliveryDetails>> {
    session
        .insert(session_keys::DELIVERY_DETAILS, &details)
        .await?;
    Ok(Json(details))
}

/// GET /api/checkout/summary
#[instrument(skip(state, session))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<OrderSummary>> {
    let cart = load_cart(&session).await?;
    Ok(Json(OrderSummary::calculate(
        &cart,
        query.order_type.unwrap_or_default(),
        &state.config().pricing,
    )))
}

/// POST /api/checkout
///
/// Responds `201 Created` with the confirmed order. A rejected checkout
/// responds `422` with every problem the gate found.
#[instrument(skip(state, session, auth, body), fields(
    order_type = %body.order_type,
    payment_method = %body.payment_method,
))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Json(body): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let OptionalAuth(user) = auth;
    let cart = load_cart(&session).await?;

    let delivery = match body.delivery {
        Some(details) => Some(details),
        None => load_delivery(&session).await?,
    };

    add_breadcrumb(
        "checkout",
        "Placing order",
        Some(&[
            ("order_type", body.order_type.as_str()),
            ("payment_method", body.payment_method.as_str()),
        ]),
    );

    let choice = CheckoutChoice {
        order_type: body.order_type,
        payment_method: body.payment_method,
        terms_accepted: body.terms_accepted,
        delivery: delivery.as_ref(),
    };

    let order = OrderService::new(state.pool(), state.gate(), state.payments())
        .checkout(user.as_ref(), &cart, choice, Utc::now())
        .await?;

    session.remove_value(session_keys::CART).await?;
    session.remove_value(session_keys::DELIVERY_DETAILS).await?;

    info!(order_id = %order.order.id, "Checkout complete, cart cleared");

    Ok((StatusCode::CREATED, Json(order)))
}
