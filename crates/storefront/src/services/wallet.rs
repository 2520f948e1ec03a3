//! Wallet balance, top-ups, reward redemption and the loyalty overview.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, instrument};

use cafe_amka_core::loyalty::{self, Reward, TierProgress};
use cafe_amka_core::{LoyaltyError, Money, PaymentMethod, TransactionId, TransactionKind};

use crate::db::{OrderRepository, RepositoryError, TransactionRepository, WalletRepository};
use crate::models::{CurrentUser, Transaction, Wallet};
use crate::services::payment::{PaymentError, PaymentGateway};

/// Largest single top-up, in shillings.
pub const MAX_TOP_UP: i64 = 100_000;
/// Entries shown in the loyalty activity feed.
const RECENT_ACTIVITY_LIMIT: i64 = 10;
/// Entries returned by the ledger endpoint.
const TRANSACTION_PAGE: i64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("wallet not found")]
    NotFound,

    #[error("top-up amount must be between KSh 1 and KSh 100,000")]
    InvalidTopUpAmount,

    #[error("{0} cannot be used to top up the wallet")]
    UnsupportedTopUpMethod(PaymentMethod),

    #[error(transparent)]
    Loyalty(#[from] LoyaltyError),

    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Wallet with its derived loyalty standing.
#[derive(Debug, Clone, Serialize)]
pub struct WalletOverview {
    #[serde(flatten)]
    pub wallet: Wallet,
    pub tier: TierProgress,
    pub next_reward: Option<NextReward>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NextReward {
    pub reward: Reward,
    pub name: &'static str,
    pub points_needed: u32,
}

impl NextReward {
    fn for_points(points: u32) -> Option<Self> {
        Reward::next_for(points).map(|(reward, points_needed)| Self {
            reward,
            name: reward.name(),
            points_needed,
        })
    }
}

/// Outcome of a redemption.
#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub reward: Reward,
    pub name: &'static str,
    pub points_used: u32,
    pub wallet: Wallet,
}

/// One line in the loyalty activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct LoyaltyActivity {
    pub id: TransactionId,
    pub action: String,
    pub date: DateTime<Utc>,
    pub details: String,
    pub points: i64,
    pub amount: Money,
}

impl From<&Transaction> for LoyaltyActivity {
    fn from(tx: &Transaction) -> Self {
        let is_reward = tx.kind == TransactionKind::LoyaltyReward;

        let action = if is_reward {
            "Points earned from order".to_owned()
        } else {
            let method = tx
                .details
                .get("payment_method")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            format!("Payment via {method}")
        };

        let details = tx.description().map_or_else(
            || {
                if is_reward {
                    format!("{} points awarded", tx.amount)
                } else {
                    "Order payment processed".to_owned()
                }
            },
            str::to_owned,
        );

        Self {
            id: tx.id,
            action,
            date: tx.created_at,
            details,
            points: if is_reward { tx.amount } else { 0 },
            amount: if tx.kind == TransactionKind::Purchase {
                Money::from_cents(tx.amount.saturating_abs())
            } else {
                Money::ZERO
            },
        }
    }
}

/// Points, spend and recent activity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyOverview {
    pub total_points: u32,
    pub total_spent: Money,
    pub total_orders: u32,
    pub tier: TierProgress,
    pub next_reward: Option<NextReward>,
    pub recent_activity: Vec<LoyaltyActivity>,
}

pub struct WalletService<'a> {
    pool: &'a PgPool,
    payments: &'a PaymentGateway,
}

impl<'a> WalletService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, payments: &'a PaymentGateway) -> Self {
        Self { pool, payments }
    }

    async fn wallet(&self, user: &CurrentUser) -> Result<Wallet, WalletError> {
        WalletRepository::new(self.pool)
            .get_by_user(user.id)
            .await?
            .ok_or(WalletError::NotFound)
    }

    /// Balance, points and tier.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::NotFound` if the customer has no wallet.
    pub async fn overview(&self, user: &CurrentUser) -> Result<WalletOverview, WalletError> {
        let wallet = self.wallet(user).await?;
        Ok(WalletOverview {
            tier: TierProgress::for_points(wallet.points),
            next_reward: NextReward::for_points(wallet.points),
            wallet,
        })
    }

    /// The customer's ledger, newest first.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Repository` if the database read fails.
    pub async fn transactions(&self, user: &CurrentUser) -> Result<Vec<Transaction>, WalletError> {
        Ok(TransactionRepository::new(self.pool)
            .list_for_user(user.id, TRANSACTION_PAGE)
            .await?)
    }

    /// Charge `method` and credit the wallet, with bonus points for large top-ups.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::InvalidTopUpAmount` outside KSh 1 to `MAX_TOP_UP`.
    /// Returns `WalletError::UnsupportedTopUpMethod` for wallet or pay-later.
    #[instrument(skip(self, user), fields(user_id = %user.id, amount = %amount))]
    pub async fn top_up(
        &self,
        user: &CurrentUser,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<WalletOverview, WalletError> {
        if amount < Money::from_shillings(1) || amount > Money::from_shillings(MAX_TOP_UP) {
            return Err(WalletError::InvalidTopUpAmount);
        }
        if matches!(method, PaymentMethod::Wallet | PaymentMethod::Paylater) {
            return Err(WalletError::UnsupportedTopUpMethod(method));
        }

        let receipt = self.payments.charge(user.id, method, amount).await?;
        let bonus = loyalty::top_up_bonus(amount);

        let details = json!({
            "payment_method": method,
            "transaction_id": receipt.transaction_id,
            "bonus_points": bonus,
            "description": format!("Wallet top-up of {amount} via {method}"),
        });

        let wallet = WalletRepository::new(self.pool)
            .top_up(user.id, amount, bonus, &details)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => WalletError::NotFound,
                other => other.into(),
            })?;

        info!(bonus_points = bonus, "Wallet topped up");

        Ok(WalletOverview {
            tier: TierProgress::for_points(wallet.points),
            next_reward: NextReward::for_points(wallet.points),
            wallet,
        })
    }

    /// Spend points on a reward.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Loyalty` if the balance does not cover the reward.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn redeem(&self, user: &CurrentUser, reward: Reward) -> Result<Redemption, WalletError> {
        let wallet = self.wallet(user).await?;
        reward.redeem(wallet.points)?;

        let details = json!({
            "reward": reward.slug(),
            "description": format!("Redeemed {} for {} points", reward.name(), reward.cost()),
        });

        let wallet = WalletRepository::new(self.pool)
            .redeem_points(user.id, reward.cost(), &details)
            .await
            .map_err(|e| match e {
                // Points were spent concurrently between the check and the update.
                RepositoryError::Conflict(_) => WalletError::Loyalty(LoyaltyError::InsufficientPoints {
                    reward: reward.name(),
                    needed: reward.cost(),
                    available: wallet.points,
                }),
                other => other.into(),
            })?;

        info!(reward = reward.slug(), "Reward redeemed");

        Ok(Redemption {
            reward,
            name: reward.name(),
            points_used: reward.cost(),
            wallet,
        })
    }

    /// Points, lifetime spend, order count and recent activity.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Repository` if a database read fails.
    pub async fn loyalty(&self, user: &CurrentUser) -> Result<LoyaltyOverview, WalletError> {
        let points = WalletRepository::new(self.pool)
            .get_by_user(user.id)
            .await?
            .map_or(0, |w| w.points);
        let totals = OrderRepository::new(self.pool)
            .totals_for_user(user.id)
            .await?;
        let recent = TransactionRepository::new(self.pool)
            .recent_loyalty_activity(user.id, RECENT_ACTIVITY_LIMIT)
            .await?;

        Ok(LoyaltyOverview {
            total_points: points,
            total_spent: totals.spent,
            total_orders: totals.orders,
            tier: TierProgress::for_points(points),
            next_reward: NextReward::for_points(points),
            recent_activity: recent.iter().map(LoyaltyActivity::from).collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cafe_amka_core::{OrderId, TransactionStatus, UserId};

    fn ledger_row(kind: TransactionKind, amount: i64, details: serde_json::Value) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            user_id: UserId::generate(),
            order_id: Some(OrderId::generate()),
            kind,
            amount,
            points_earned: 0,
            points_used: 0,
            status: TransactionStatus::Completed,
            details,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reward_activity() {
        let row = ledger_row(
            TransactionKind::LoyaltyReward,
            7,
            json!({ "description": "Loyalty points earned from order #9fa0b1c2" }),
        );
        let activity = LoyaltyActivity::from(&row);

        assert_eq!(activity.action, "Points earned from order");
        assert_eq!(activity.details, "Loyalty points earned from order #9fa0b1c2");
        assert_eq!(activity.points, 7);
        assert_eq!(activity.amount, Money::ZERO);
    }

    #[test]
    fn test_wallet_purchase_activity() {
        let row = ledger_row(
            TransactionKind::Purchase,
            -76_000,
            json!({ "payment_method": "wallet" }),
        );
        let activity = LoyaltyActivity::from(&row);

        assert_eq!(activity.action, "Payment via wallet");
        assert_eq!(activity.details, "Order payment processed");
        assert_eq!(activity.points, 0);
        assert_eq!(activity.amount, Money::from_shillings(760));
    }

    #[test]
    fn test_reward_without_description() {
        let row = ledger_row(TransactionKind::LoyaltyReward, 12, json!({}));
        assert_eq!(LoyaltyActivity::from(&row).details, "12 points awarded");
    }

    #[test]
    fn test_next_reward() {
        let next = NextReward::for_points(120).unwrap();
        assert_eq!(next.reward, Reward::FreePastry);
        assert_eq!(next.points_needed, 30);
        assert!(NextReward::for_points(300).is_none());
    }
}
