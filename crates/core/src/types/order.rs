//! How an order is fulfilled and how it is paid for.

use serde::{Deserialize, Serialize};

/// Fulfilment mode chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_type", rename_all = "kebab-case")
)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    /// Delivered to the customer's address. Carries a delivery fee.
    #[default]
    Delivery,
    /// Collected at the counter.
    Pickup,
    /// Eaten in the café.
    DineIn,
}

impl OrderType {
    /// Whether this order type needs delivery details before checkout.
    #[must_use]
    pub const fn requires_delivery_details(self) -> bool {
        matches!(self, Self::Delivery)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Pickup => "pickup",
            Self::DineIn => "dine-in",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(Self::Delivery),
            "pickup" => Ok(Self::Pickup),
            "dine-in" => Ok(Self::DineIn),
            _ => Err(format!("invalid order type: {s}")),
        }
    }
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "kebab-case")
)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Debited from the customer's café wallet.
    Wallet,
    /// M-Pesa mobile money.
    Mpesa,
    Card,
    /// Settled later at the counter.
    Paylater,
}

impl PaymentMethod {
    /// Whether paying this way debits the customer's wallet balance.
    #[must_use]
    pub const fn debits_wallet(self) -> bool {
        matches!(self, Self::Wallet)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::Mpesa => "mpesa",
            Self::Card => "card",
            Self::Paylater => "paylater",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wallet" => Ok(Self::Wallet),
            "mpesa" => Ok(Self::Mpesa),
            "card" => Ok(Self::Card),
            "paylater" => Ok(Self::Paylater),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderType::DineIn).unwrap(),
            "\"dine-in\""
        );
        assert_eq!("pickup".parse::<OrderType>().unwrap(), OrderType::Pickup);
        assert!("takeaway".parse::<OrderType>().is_err());
    }

    #[test]
    fn test_only_delivery_needs_details() {
        assert!(OrderType::Delivery.requires_delivery_details());
        assert!(!OrderType::Pickup.requires_delivery_details());
        assert!(!OrderType::DineIn.requires_delivery_details());
    }

    #[test]
    fn test_payment_method_parse_display() {
        for method in [
            PaymentMethod::Wallet,
            PaymentMethod::Mpesa,
            PaymentMethod::Card,
            PaymentMethod::Paylater,
        ] {
            assert_eq!(method.to_string().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!(PaymentMethod::Wallet.debits_wallet());
        assert!(!PaymentMethod::Mpesa.debits_wallet());
    }
}
