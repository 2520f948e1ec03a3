//! Staff order commands.
//!
//! # Usage
//!
//! ```bash
//! # Move an order one step along pending → confirmed → processing → shipped → completed
//! cafe-cli orders advance 6f1c2a80-3d4e-4f5a-9b6c-7d8e9fa0b1c2
//!
//! # Cancel an order that has not completed
//! cafe-cli orders cancel 6f1c2a80-3d4e-4f5a-9b6c-7d8e9fa0b1c2
//! ```

use std::time::Duration;

use cafe_amka_core::{CheckoutGate, OrderId};
use cafe_amka_storefront::config::get_database_url;
use cafe_amka_storefront::db;
use cafe_amka_storefront::models::Order;
use cafe_amka_storefront::services::{OrderService, PaymentGateway};

/// What to do with the order.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Advance,
    Cancel,
}

/// Apply `action` to the order with the given id.
///
/// # Errors
///
/// Returns an error if the id is malformed, the order does not exist, or the
/// order's status does not allow the change.
pub async fn update(id: &str, action: Action) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let id: OrderId = id.parse().map_err(|_| format!("Invalid order id: {id}"))?;

    let database_url = get_database_url("CAFE_DATABASE_URL")?;
    let pool = db::create_pool(&database_url).await?;

    // Status changes never charge anyone
    let payments = PaymentGateway::new(Duration::ZERO);
    let service = OrderService::new(&pool, CheckoutGate::default(), &payments);

    let order: Order = match action {
        Action::Advance => service.advance(id).await?,
        Action::Cancel => service.cancel_any(id).await?,
    };

    tracing::info!(
        order = %order.reference,
        status = %order.status,
        total = %order.total_amount,
        "Order updated"
    );

    Ok(())
}
