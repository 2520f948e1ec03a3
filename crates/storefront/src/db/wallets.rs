//! Wallet repository.
//!
//! Balance changes and their ledger rows are written in the same database
//! transaction so the wallet and `transactions` never disagree.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};

use cafe_amka_core::{Money, TransactionKind, UserId, WalletId};

use super::transactions::{self, NewTransaction};
use super::{RepositoryError, to_i32, to_u32};
use crate::models::Wallet;

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: WalletId,
    user_id: UserId,
    balance_cents: i64,
    points: i32,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WalletRow> for Wallet {
    type Error = RepositoryError;

    fn try_from(row: WalletRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            balance: Money::from_cents(row.balance_cents),
            points: to_u32(row.points, "wallet points")?,
            updated_at: row.updated_at,
        })
    }
}

/// Convert an amount to cents for the ledger.
pub(crate) fn cents(amount: Money) -> Result<i64, RepositoryError> {
    amount
        .to_cents()
        .ok_or_else(|| RepositoryError::DataCorruption(format!("amount out of range: {amount}")))
}

/// Credit or debit a wallet inside an open transaction.
///
/// `balance_delta_cents` may be negative. A debit that would take the
/// balance below zero returns `RepositoryError::Conflict`.
pub(crate) async fn adjust_in_tx(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    user_id: UserId,
    balance_delta_cents: i64,
    points_delta: i32,
) -> Result<Wallet, RepositoryError> {
    sqlx::query_as::<_, WalletRow>(
        r"
        UPDATE wallets
        SET balance_cents = balance_cents + $2,
            points = points + $3,
            updated_at = now()
        WHERE user_id = $1
          AND balance_cents + $2 >= 0
          AND points + $3 >= 0
        RETURNING id, user_id, balance_cents, points, updated_at
        ",
    )
    .bind(user_id)
    .bind(balance_delta_cents)
    .bind(points_delta)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| RepositoryError::Conflict("insufficient wallet funds or points".to_owned()))
    .and_then(Wallet::try_from)
}

/// Repository for wallet balances.
pub struct WalletRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WalletRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's wallet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Wallet>, RepositoryError> {
        sqlx::query_as::<_, WalletRow>(
            r"
            SELECT id, user_id, balance_cents, points, updated_at
            FROM wallets
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(Wallet::try_from)
        .transpose()
    }

    /// Add money to the wallet and record a top-up ledger row.
    ///
    /// `bonus_points` are credited alongside the money.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user has no wallet.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_up(
        &self,
        user_id: UserId,
        amount: Money,
        bonus_points: u32,
        details: &serde_json::Value,
    ) -> Result<Wallet, RepositoryError> {
        let amount_cents = cents(amount)?;
        let bonus = to_i32(bonus_points, "bonus points")?;

        let mut tx = self.pool.begin().await?;

        transactions::insert_in_tx(
            &mut tx,
            &NewTransaction {
                user_id,
                order_id: None,
                kind: TransactionKind::TopUp,
                amount: amount_cents,
                points_earned: bonus_points,
                points_used: 0,
                details: details.clone(),
            },
        )
        .await?;

        let wallet = adjust_in_tx(&mut tx, user_id, amount_cents, bonus).await?;

        tx.commit().await?;
        Ok(wallet)
    }

    /// Spend points and record a points-redemption ledger row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the balance no longer covers `points`.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn redeem_points(
        &self,
        user_id: UserId,
        points: u32,
        details: &serde_json::Value,
    ) -> Result<Wallet, RepositoryError> {
        let points_delta = to_i32(points, "points")?;

        let mut tx = self.pool.begin().await?;

        let wallet = adjust_in_tx(&mut tx, user_id, 0, -points_delta).await?;

        transactions::insert_in_tx(
            &mut tx,
            &NewTransaction {
                user_id,
                order_id: None,
                kind: TransactionKind::PointsRedemption,
                amount: -i64::from(points),
                points_earned: 0,
                points_used: points,
                details: details.clone(),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(wallet)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_row_converts_cents_to_money() {
        let wallet = Wallet::try_from(WalletRow {
            id: WalletId::generate(),
            user_id: UserId::generate(),
            balance_cents: 125_050,
            points: 40,
            updated_at: Utc::now(),
        })
        .unwrap();

        assert_eq!(wallet.balance, Money::from_cents(125_050));
        assert_eq!(wallet.points, 40);
    }

    #[test]
    fn test_negative_points_are_corruption() {
        let err = Wallet::try_from(WalletRow {
            id: WalletId::generate(),
            user_id: UserId::generate(),
            balance_cents: 0,
            points: -1,
            updated_at: Utc::now(),
        })
        .unwrap_err();

        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_cents_rounds_to_minor_units() {
        assert_eq!(cents(Money::from_shillings(1_000)).unwrap(), 100_000);
    }
}
