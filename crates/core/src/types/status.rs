//! Status enums for orders, reservations and wallet transactions.
//!
//! All of them map to Postgres enum types of the same name when the
//! `postgres` feature is on.

use serde::{Deserialize, Serialize};

/// Order lifecycle.
///
/// Orders move forward along `pending → confirmed → processing → shipped →
/// completed`. Any state before `completed` may instead move to `cancelled`.
/// `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "kebab-case")
)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// The forward progression, in order.
    pub const PROGRESSION: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Completed,
    ];

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the customer (or staff) may still cancel.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        !self.is_terminal()
    }

    /// The next status on the forward path, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Processing),
            Self::Processing => Some(Self::Shipped),
            Self::Shipped => Some(Self::Completed),
            Self::Completed | Self::Cancelled => None,
        }
    }

    /// Every status reachable in one step.
    #[must_use]
    pub fn next_statuses(self) -> Vec<Self> {
        let mut out: Vec<Self> = self.next().into_iter().collect();
        if self.is_cancellable() {
            out.push(Self::Cancelled);
        }
        out
    }

    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target) || (target == Self::Cancelled && self.is_cancellable())
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Table reservation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "reservation_status", rename_all = "kebab-case")
)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Pending and confirmed reservations hold a table.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// Kind of wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "transaction_kind", rename_all = "kebab-case")
)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    /// Order payment. Amount is negative cents for wallet payments, zero otherwise.
    Purchase,
    /// Money added to the wallet, in cents.
    TopUp,
    /// Points earned, amount is the point count.
    LoyaltyReward,
    /// Points spent on a reward, amount is the negative point count.
    PointsRedemption,
}

impl TransactionKind {
    /// Kinds shown in the loyalty activity feed.
    #[must_use]
    pub const fn is_loyalty_activity(self) -> bool {
        matches!(self, Self::Purchase | Self::LoyaltyReward)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "transaction_status", rename_all = "kebab-case")
)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionStatus {
    Pending,
    #[default]
    Completed,
    Failed,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_progression() {
        let mut status = OrderStatus::Pending;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            assert!(status.can_transition_to(next));
            status = next;
            seen.push(status);
        }
        assert_eq!(seen, OrderStatus::PROGRESSION.to_vec());
    }

    #[test]
    fn test_cancel_only_before_terminal() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Completed.next_statuses().is_empty());
        assert_eq!(
            OrderStatus::Confirmed.next_statuses(),
            vec![OrderStatus::Processing, OrderStatus::Cancelled]
        );
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in OrderStatus::PROGRESSION {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&TransactionKind::TopUp).unwrap(),
            "\"top-up\""
        );
    }

    #[test]
    fn test_reservation_active() {
        assert!(ReservationStatus::Pending.is_active());
        assert!(ReservationStatus::Confirmed.is_active());
        assert!(!ReservationStatus::Cancelled.is_active());
        assert!(!ReservationStatus::Completed.is_active());
    }
}
