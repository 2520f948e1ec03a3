//! Order repository.
//!
//! Placing an order writes the order, its items, both ledger rows and the
//! wallet adjustment in one database transaction. Either everything lands
//! or nothing does.

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use cafe_amka_core::{
    CartLineItem, CheckoutPlan, DeliveryDetails, MenuItemId, Money, OrderId, OrderItemId,
    OrderStatus, OrderType, PaymentMethod, SelectedOption, TransactionKind, UserId,
};

use super::transactions::{self, NewTransaction};
use super::wallets::{self, cents};
use super::{RepositoryError, to_i32, to_u32};
use crate::models::{Order, OrderDetail, OrderItem};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    order_type: OrderType,
    payment_method: PaymentMethod,
    subtotal: Money,
    service_fee: Money,
    delivery_fee: Money,
    total_amount: Money,
    points_earned: i32,
    delivery_details: Option<serde_json::Value>,
    payment_reference: Option<String>,
    placed_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let delivery_details = row
            .delivery_details
            .filter(|v| !v.is_null())
            .map(serde_json::from_value::<DeliveryDetails>)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid delivery details on order {}: {e}",
                    row.id
                ))
            })?;

        Ok(Self {
            id: row.id,
            reference: row.id.short_ref(),
            user_id: row.user_id,
            status: row.status,
            order_type: row.order_type,
            payment_method: row.payment_method,
            subtotal: row.subtotal,
            service_fee: row.service_fee,
            delivery_fee: row.delivery_fee,
            total_amount: row.total_amount,
            points_earned: to_u32(row.points_earned, "points_earned")?,
            delivery_details,
            payment_reference: row.payment_reference,
            placed_at: row.placed_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    menu_item_id: Option<MenuItemId>,
    name: String,
    quantity: i32,
    unit_price: Money,
    subtotal: Money,
    customizations: serde_json::Value,
    special_instructions: Option<String>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = to_u32(row.quantity, "quantity")?;
        if quantity == 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "order item {} has zero quantity",
                row.id
            )));
        }

        // Rows written before options were recorded hold an empty object.
        let options = match row.customizations {
            serde_json::Value::Array(_) => {
                serde_json::from_value::<Vec<SelectedOption>>(row.customizations).map_err(|e| {
                    RepositoryError::DataCorruption(format!(
                        "invalid options on order item {}: {e}",
                        row.id
                    ))
                })?
            }
            _ => Vec::new(),
        };

        Ok(Self {
            id: row.id,
            menu_item_id: row.menu_item_id,
            name: row.name,
            quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
            options,
            special_instructions: row.special_instructions,
        })
    }
}

const ORDER_COLUMNS: &str = r"
    id, user_id, status, order_type, payment_method, subtotal, service_fee,
    delivery_fee, total_amount, points_earned, delivery_details,
    payment_reference, placed_at, updated_at
";

/// Everything needed to persist a paid order.
#[derive(Debug, Clone, Copy)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub plan: &'a CheckoutPlan,
    pub lines: &'a [CartLineItem],
    pub payment_reference: &'a str,
}

/// Aggregate figures for the loyalty overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderTotals {
    pub orders: u32,
    pub spent: Money,
}

#[derive(sqlx::FromRow)]
struct OrderTotalsRow {
    orders: i64,
    spent: Money,
}

/// Repository for orders and their items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a paid order.
    ///
    /// Inserts the order as pending with its items, records the loyalty
    /// reward and purchase ledger rows, adjusts the wallet (debiting the
    /// total for wallet payments and crediting earned points) and finally
    /// marks the order confirmed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a wallet payment is no longer
    /// covered by the balance.
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    #[instrument(skip(self, new), fields(user_id = %new.user_id, lines = new.lines.len()))]
    pub async fn place(&self, new: NewOrder<'_>) -> Result<OrderDetail, RepositoryError> {
        let summary = &new.plan.summary;
        let points = to_i32(summary.points_earned, "points_earned")?;
        let total_cents = cents(summary.total)?;
        let delivery = new
            .plan
            .delivery
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("delivery details: {e}")))?;

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r"
            INSERT INTO orders
                (user_id, status, order_type, payment_method, subtotal, service_fee,
                 delivery_fee, total_amount, points_earned, delivery_details, payment_reference)
            VALUES ($1, 'pending', $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS}
            "
        );
        let order_row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(new.user_id)
            .bind(new.plan.order_type)
            .bind(new.plan.payment_method)
            .bind(summary.subtotal)
            .bind(summary.service_fee)
            .bind(summary.delivery_fee)
            .bind(summary.total)
            .bind(points)
            .bind(delivery)
            .bind(new.payment_reference)
            .fetch_one(&mut *tx)
            .await?;
        let order_id = order_row.id;
        let reference = order_id.short_ref();

        let mut items = Vec::with_capacity(new.lines.len());
        for (position, line) in (0u32..).zip(new.lines) {
            let row = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO order_items
                    (order_id, position, menu_item_id, name, quantity, unit_price, subtotal,
                     customizations, special_instructions)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id, menu_item_id, name, quantity, unit_price, subtotal,
                          customizations, special_instructions
                ",
            )
            .bind(order_id)
            .bind(to_i32(position, "position")?)
            .bind(line.menu_item_id)
            .bind(&line.name)
            .bind(to_i32(line.quantity, "quantity")?)
            .bind(line.unit_price)
            .bind(line.total_price)
            .bind(Json(&line.selected_options))
            .bind(line.special_instructions.as_deref())
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderItem::try_from(row)?);
        }

        if summary.points_earned > 0 {
            transactions::insert_in_tx(
                &mut tx,
                &NewTransaction {
                    user_id: new.user_id,
                    order_id: Some(order_id),
                    kind: TransactionKind::LoyaltyReward,
                    amount: i64::from(summary.points_earned),
                    points_earned: summary.points_earned,
                    points_used: 0,
                    details: json!({
                        "order_id": order_id,
                        "points_earned": summary.points_earned,
                        "order_total": summary.total,
                        "description": format!("Loyalty points earned from order #{reference}"),
                    }),
                },
            )
            .await?;
        }

        let method = new.plan.payment_method;
        let debit_cents = if method.debits_wallet() { total_cents } else { 0 };

        transactions::insert_in_tx(
            &mut tx,
            &NewTransaction {
                user_id: new.user_id,
                order_id: Some(order_id),
                kind: TransactionKind::Purchase,
                amount: -debit_cents,
                points_earned: 0,
                points_used: 0,
                details: json!({
                    "order_id": order_id,
                    "payment_method": method,
                    "transaction_id": new.payment_reference,
                    "order_total": summary.total,
                    "description": format!("Payment for order #{reference} via {method}"),
                }),
            },
        )
        .await?;

        wallets::adjust_in_tx(&mut tx, new.user_id, -debit_cents, points).await?;

        let sql = format!(
            r"
            UPDATE orders SET status = 'confirmed', updated_at = now()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        );
        let order_row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(OrderDetail {
            order: Order::try_from(order_row)?,
            items,
        })
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY placed_at DESC"
        );

        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    /// Get an order by ID, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");

        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }

    /// Get an order with its items, only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_detail(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };
        if order.user_id != user_id {
            return Ok(None);
        }

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, menu_item_id, name, quantity, unit_price, subtotal,
                   customizations, special_instructions
            FROM order_items
            WHERE order_id = $1
            ORDER BY position
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(OrderDetail { order, items }))
    }

    /// Move an order to `target` if the lifecycle allows it.
    ///
    /// The current status is read under a row lock so concurrent updates
    /// cannot skip a step.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        target: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: OrderStatus =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        if !current.can_transition_to(target) {
            return Err(RepositoryError::Conflict(format!(
                "order cannot move from {current} to {target}"
            )));
        }

        let sql = format!(
            r"
            UPDATE orders SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(target)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Order::try_from(row)
    }

    /// Order count and total spend for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals_for_user(&self, user_id: UserId) -> Result<OrderTotals, RepositoryError> {
        let row = sqlx::query_as::<_, OrderTotalsRow>(
            r"
            SELECT COUNT(*) AS orders, COALESCE(SUM(total_amount), 0) AS spent
            FROM orders
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(OrderTotals {
            orders: u32::try_from(row.orders).map_err(|_| {
                RepositoryError::DataCorruption(format!("order count out of range: {}", row.orders))
            })?,
            spent: row.spent,
        })
    }
}
