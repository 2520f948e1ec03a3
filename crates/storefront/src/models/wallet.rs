//! Wallet and ledger types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cafe_amka_core::{Money, OrderId, TransactionId, TransactionKind, TransactionStatus, UserId, WalletId};

/// A customer's stored-value wallet and loyalty points balance.
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub balance: Money,
    pub points: u32,
    pub updated_at: DateTime<Utc>,
}

/// One ledger entry.
///
/// `amount` is in cents for purchases and top-ups and in points for loyalty
/// rows, matching how the ledger has always been read by the apps.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub kind: TransactionKind,
    pub amount: i64,
    pub points_earned: u32,
    pub points_used: u32,
    pub status: TransactionStatus,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Human-readable description stored in the details, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.details.get("description").and_then(|v| v.as_str())
    }
}
