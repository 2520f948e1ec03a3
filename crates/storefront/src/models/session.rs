//! What the storefront keeps in a customer's session.

use serde::{Deserialize, Serialize};

use cafe_amka_core::{Email, UserId};

/// The signed-in customer. Everything else about them is loaded per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
}

pub mod keys {
    /// The logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// The customer's cart (`cafe_amka_core::Cart`).
    pub const CART: &str = "cart";

    /// Delivery details captured before checkout.
    pub const DELIVERY_DETAILS: &str = "delivery_details";
}
