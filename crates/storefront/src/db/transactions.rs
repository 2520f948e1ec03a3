//! Wallet ledger repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};

use cafe_amka_core::{OrderId, TransactionId, TransactionKind, TransactionStatus, UserId};

use super::{RepositoryError, to_i32, to_u32};
use crate::models::Transaction;

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: TransactionId,
    user_id: UserId,
    order_id: Option<OrderId>,
    kind: TransactionKind,
    amount: i64,
    points_earned: i32,
    points_used: i32,
    status: TransactionStatus,
    details: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = RepositoryError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            order_id: row.order_id,
            kind: row.kind,
            amount: row.amount,
            points_earned: to_u32(row.points_earned, "points_earned")?,
            points_used: to_u32(row.points_used, "points_used")?,
            status: row.status,
            details: row.details,
            created_at: row.created_at,
        })
    }
}

/// A ledger row to be written.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub kind: TransactionKind,
    pub amount: i64,
    pub points_earned: u32,
    pub points_used: u32,
    pub details: serde_json::Value,
}

/// Insert a ledger row inside an open transaction.
pub(crate) async fn insert_in_tx(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    new: &NewTransaction,
) -> Result<TransactionId, RepositoryError> {
    let id: TransactionId = sqlx::query_scalar(
        r"
        INSERT INTO transactions
            (user_id, order_id, kind, amount, points_earned, points_used, details)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        ",
    )
    .bind(new.user_id)
    .bind(new.order_id)
    .bind(new.kind)
    .bind(new.amount)
    .bind(to_i32(new.points_earned, "points_earned")?)
    .bind(to_i32(new.points_used, "points_used")?)
    .bind(&new.details)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}

const TRANSACTION_COLUMNS: &str = r"
    id, user_id, order_id, kind, amount, points_earned, points_used,
    status, details, created_at
";

/// Repository for reading the wallet ledger.
pub struct TransactionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's ledger, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "
        );

        sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// Recent purchase and loyalty-reward rows for the loyalty feed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_loyalty_activity(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE user_id = $1 AND kind IN ($2, $3)
            ORDER BY created_at DESC
            LIMIT $4
            "
        );

        sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(user_id)
            .bind(TransactionKind::Purchase)
            .bind(TransactionKind::LoyaltyReward)
            .bind(limit)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }
}
