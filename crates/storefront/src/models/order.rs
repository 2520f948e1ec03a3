//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cafe_amka_core::{
    DeliveryDetails, MenuItemId, Money, OrderId, OrderItemId, OrderStatus, OrderType,
    PaymentMethod, SelectedOption, UserId,
};

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Short reference shown to customers.
    pub reference: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub service_fee: Money,
    pub delivery_fee: Money,
    pub total_amount: Money,
    pub points_earned: u32,
    pub delivery_details: Option<DeliveryDetails>,
    pub payment_reference: Option<String>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub menu_item_id: Option<MenuItemId>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
    pub options: Vec<SelectedOption>,
    pub special_instructions: Option<String>,
}

/// An order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
