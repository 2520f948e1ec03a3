//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! # Menu
//! GET    /api/menu                       - Categories and available items
//! GET    /api/menu/featured?limit=       - Newest items
//! GET    /api/menu/categories/{id}       - Items in a category
//! GET    /api/menu/items/{id}            - Single item with its option groups
//!
//! # Cart (session-backed)
//! GET    /api/cart?order_type=           - Cart with summary preview
//! DELETE /api/cart                       - Clear the cart
//! POST   /api/cart/items                 - Add a configured item
//! PATCH  /api/cart/items/{key}           - Set quantity (0 removes)
//! DELETE /api/cart/items/{key}           - Remove a line
//! GET    /api/cart/count                 - Total item count
//!
//! # Checkout
//! PUT    /api/checkout/delivery          - Save delivery details
//! GET    /api/checkout/summary?order_type= - Fees, total and points
//! POST   /api/checkout                   - Validate, pay and place the order
//!
//! # Orders (requires auth)
//! GET    /api/orders                     - Order history
//! GET    /api/orders/{id}                - Order with items
//! POST   /api/orders/{id}/cancel         - Cancel an order still in progress
//!
//! # Reservations
//! GET    /api/reservations/availability  - Free slots for a date and party
//! GET    /api/reservations               - Customer's reservations (auth)
//! POST   /api/reservations               - Book a table (auth)
//! POST   /api/reservations/{id}/cancel   - Cancel a booking (auth)
//!
//! # Wallet and loyalty (requires auth)
//! GET    /api/wallet                     - Balance, points and tier
//! GET    /api/wallet/transactions        - Ledger
//! POST   /api/wallet/top-up              - Add funds
//! POST   /api/wallet/redeem              - Spend points on a reward
//! GET    /api/loyalty                    - Points, totals and recent activity
//!
//! # Profile (requires auth)
//! GET    /api/profile                    - Customer profile
//! PUT    /api/profile                    - Partial update
//!
//! # Auth
//! POST   /auth/register                  - Create an account and sign in
//! POST   /auth/login                     - Sign in
//! POST   /auth/logout                    - Sign out (drops the session)
//! GET    /auth/me                        - Current customer
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod loyalty;
pub mod menu;
pub mod orders;
pub mod profile;
pub mod reservations;
pub mod wallet;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the menu routes router.
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(menu::index))
        .route("/featured", get(menu::featured))
        .route("/categories/{id}", get(menu::category))
        .route("/items/{id}", get(menu::item))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{key}",
            patch(cart::update).delete(cart::remove),
        )
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place_order))
        .route("/delivery", put(checkout::save_delivery))
        .route("/summary", get(checkout::summary))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the reservation routes router.
pub fn reservation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(reservations::index).post(reservations::create))
        .route("/availability", get(reservations::availability))
        .route("/{id}/cancel", post(reservations::cancel))
}

/// Create the wallet routes router.
pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wallet::show))
        .route("/transactions", get(wallet::transactions))
        .route("/top-up", post(wallet::top_up))
        .route("/redeem", post(wallet::redeem))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/menu", menu_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/reservations", reservation_routes())
        .nest("/wallet", wallet_routes())
        .route("/loyalty", get(loyalty::show))
        .route("/profile", get(profile::show).put(profile::update));

    Router::new()
        .nest("/api", api)
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
}
