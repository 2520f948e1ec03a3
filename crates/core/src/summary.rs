//! Order summary: subtotal, fees, total and loyalty points.
//!
//! The summary is derived from a cart snapshot and the chosen order type
//! every time it is shown. At placement its figures are copied onto the
//! order row.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{Money, OrderType};

/// Fee and points constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Flat fee added to every order.
    pub service_fee: Money,
    /// Added to delivery orders only.
    pub delivery_fee: Money,
    /// Points earned per shilling of the order total.
    pub points_rate: Decimal,
}

impl PricingPolicy {
    pub const DEFAULT_SERVICE_FEE: i64 = 50;
    pub const DEFAULT_DELIVERY_FEE: i64 = 150;

    #[must_use]
    pub fn delivery_fee_for(&self, order_type: OrderType) -> Money {
        if order_type.requires_delivery_details() {
            self.delivery_fee
        } else {
            Money::ZERO
        }
    }

    /// Whole points earned for spending `total`, rounded down.
    #[must_use]
    pub fn points_for(&self, total: Money) -> u32 {
        if total.is_negative() {
            return 0;
        }
        (total.amount() * self.points_rate)
            .floor()
            .to_u32()
            .unwrap_or(u32::MAX)
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            service_fee: Money::from_shillings(Self::DEFAULT_SERVICE_FEE),
            delivery_fee: Money::from_shillings(Self::DEFAULT_DELIVERY_FEE),
            // 1 point per 100 KSh
            points_rate: Decimal::new(1, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub service_fee: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub points_earned: u32,
}

impl OrderSummary {
    /// Summarise the cart for the given order type.
    #[must_use]
    pub fn calculate(cart: &Cart, order_type: OrderType, policy: &PricingPolicy) -> Self {
        Self::from_subtotal(cart.total_amount(), order_type, policy)
    }

    #[must_use]
    pub fn from_subtotal(subtotal: Money, order_type: OrderType, policy: &PricingPolicy) -> Self {
        let delivery_fee = policy.delivery_fee_for(order_type);
        let total = subtotal + policy.service_fee + delivery_fee;
        Self {
            subtotal,
            service_fee: policy.service_fee,
            delivery_fee,
            total,
            points_earned: policy.points_for(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_adds_fee() {
        let summary = OrderSummary::from_subtotal(
            Money::from_shillings(800),
            OrderType::Delivery,
            &PricingPolicy::default(),
        );
        assert_eq!(summary.service_fee, Money::from_shillings(50));
        assert_eq!(summary.delivery_fee, Money::from_shillings(150));
        assert_eq!(summary.total, Money::from_shillings(1000));
        assert_eq!(summary.points_earned, 10);
    }

    #[test]
    fn test_pickup_and_dine_in_skip_delivery_fee() {
        for order_type in [OrderType::Pickup, OrderType::DineIn] {
            let summary = OrderSummary::from_subtotal(
                Money::from_shillings(800),
                order_type,
                &PricingPolicy::default(),
            );
            assert_eq!(summary.delivery_fee, Money::ZERO);
            assert_eq!(summary.total, Money::from_shillings(850));
            assert_eq!(summary.points_earned, 8);
        }
    }

    #[test]
    fn test_points_round_down() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.points_for(Money::from_shillings(199)), 1);
        assert_eq!(policy.points_for(Money::from_shillings(99)), 0);
        assert_eq!(policy.points_for(Money::from_cents(29_999)), 2);
    }

    #[test]
    fn test_empty_cart_still_has_service_fee() {
        let summary = OrderSummary::calculate(
            &Cart::new(),
            OrderType::Pickup,
            &PricingPolicy::default(),
        );
        assert_eq!(summary.subtotal, Money::ZERO);
        assert_eq!(summary.total, Money::from_shillings(50));
        assert_eq!(summary.points_earned, 0);
    }
}
