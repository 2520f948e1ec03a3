//! Order placement and lifecycle.
//!
//! Checkout runs the gate, charges the chosen payment method and persists
//! the order with its ledger rows. The caller clears the session cart once
//! this returns successfully.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use cafe_amka_core::{
    Cart, CheckoutGate, CheckoutIssue, CheckoutRequest, DeliveryDetails, Money, OrderId,
    OrderStatus, OrderType, PaymentMethod,
};

use crate::db::orders::NewOrder;
use crate::db::{OrderRepository, RepositoryError, WalletRepository};
use crate::models::{CurrentUser, Order, OrderDetail};
use crate::services::payment::{PaymentError, PaymentGateway};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The gate rejected the checkout. Carries every problem found.
    #[error("checkout is not possible")]
    Checkout(Vec<CheckoutIssue>),

    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),

    #[error("order not found")]
    NotFound,

    #[error("a {0} order cannot be cancelled")]
    CannotCancel(OrderStatus),

    #[error("a {0} order cannot be advanced")]
    CannotAdvance(OrderStatus),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What the customer chose on the checkout page.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutChoice<'a> {
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub terms_accepted: bool,
    pub delivery: Option<&'a DeliveryDetails>,
}

pub struct OrderService<'a> {
    pool: &'a PgPool,
    gate: CheckoutGate,
    payments: &'a PaymentGateway,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, gate: CheckoutGate, payments: &'a PaymentGateway) -> Self {
        Self {
            pool,
            gate,
            payments,
        }
    }

    /// Validate, pay for and persist an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Checkout` with every gate issue when the order
    /// cannot be placed, including a wallet balance that falls short by the
    /// time the order is written.
    /// Returns `OrderError::Payment` if the charge fails.
    /// Returns `OrderError::Repository` if persisting fails.
    #[instrument(skip_all, fields(
        order_type = %choice.order_type,
        payment_method = %choice.payment_method,
        lines = cart.items().len(),
    ))]
    pub async fn checkout(
        &self,
        user: Option<&CurrentUser>,
        cart: &Cart,
        choice: CheckoutChoice<'_>,
        now: DateTime<Utc>,
    ) -> Result<OrderDetail, OrderError> {
        let wallet_balance = match user {
            Some(user) if choice.payment_method.debits_wallet() => Some(
                WalletRepository::new(self.pool)
                    .get_by_user(user.id)
                    .await?
                    .map_or(Money::ZERO, |w| w.balance),
            ),
            _ => None,
        };

        let request = CheckoutRequest {
            cart,
            order_type: choice.order_type,
            payment_method: choice.payment_method,
            delivery: choice.delivery,
            authenticated: user.is_some(),
            terms_accepted: choice.terms_accepted,
            wallet_balance,
            now,
        };

        let plan = self.gate.evaluate(&request).map_err(OrderError::Checkout)?;
        let Some(user) = user else {
            return Err(OrderError::Checkout(vec![CheckoutIssue::NotAuthenticated]));
        };

        let receipt = self
            .payments
            .charge(user.id, plan.payment_method, plan.summary.total)
            .await?;

        let placed = OrderRepository::new(self.pool)
            .place(NewOrder {
                user_id: user.id,
                plan: &plan,
                lines: cart.items(),
                payment_reference: &receipt.transaction_id,
            })
            .await;

        let detail = match placed {
            Ok(detail) => detail,
            Err(RepositoryError::Conflict(reason)) => {
                warn!(%reason, "Wallet no longer covers order");
                let available = WalletRepository::new(self.pool)
                    .get_by_user(user.id)
                    .await?
                    .map_or(Money::ZERO, |w| w.balance);
                return Err(OrderError::Checkout(vec![
                    CheckoutIssue::InsufficientWalletBalance {
                        required: plan.summary.total,
                        available,
                    },
                ]));
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            order_id = %detail.order.id,
            total = %detail.order.total_amount,
            points = detail.order.points_earned,
            "Order placed"
        );

        Ok(detail)
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the database read fails.
    pub async fn history(&self, user: &CurrentUser) -> Result<Vec<Order>, OrderError> {
        Ok(OrderRepository::new(self.pool)
            .list_for_user(user.id)
            .await?)
    }

    /// One of the customer's orders with its items.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist or belongs
    /// to someone else.
    pub async fn detail(&self, user: &CurrentUser, id: OrderId) -> Result<OrderDetail, OrderError> {
        OrderRepository::new(self.pool)
            .get_detail(user.id, id)
            .await?
            .ok_or(OrderError::NotFound)
    }

    /// Cancel one of the customer's orders while it is still in progress.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the customer has no such order.
    /// Returns `OrderError::CannotCancel` if the order is completed or
    /// already cancelled.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cancel(&self, user: &CurrentUser, id: OrderId) -> Result<Order, OrderError> {
        let repo = OrderRepository::new(self.pool);
        let order = repo
            .get(id)
            .await?
            .filter(|o| o.user_id == user.id)
            .ok_or(OrderError::NotFound)?;

        if !order.status.is_cancellable() {
            return Err(OrderError::CannotCancel(order.status));
        }

        repo.update_status(id, OrderStatus::Cancelled)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => OrderError::CannotCancel(order.status),
                RepositoryError::NotFound => OrderError::NotFound,
                other => other.into(),
            })
    }

    /// Move an order one step along the kitchen progression.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist.
    /// Returns `OrderError::CannotAdvance` if it is completed or cancelled.
    #[instrument(skip(self))]
    pub async fn advance(&self, id: OrderId) -> Result<Order, OrderError> {
        let repo = OrderRepository::new(self.pool);
        let order = repo.get(id).await?.ok_or(OrderError::NotFound)?;
        let next = order
            .status
            .next()
            .ok_or(OrderError::CannotAdvance(order.status))?;

        repo.update_status(id, next).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => OrderError::CannotAdvance(order.status),
            RepositoryError::NotFound => OrderError::NotFound,
            other => other.into(),
        })
    }

    /// Cancel any order regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist.
    /// Returns `OrderError::CannotCancel` if it is already terminal.
    #[instrument(skip(self))]
    pub async fn cancel_any(&self, id: OrderId) -> Result<Order, OrderError> {
        let repo = OrderRepository::new(self.pool);
        let order = repo.get(id).await?.ok_or(OrderError::NotFound)?;

        repo.update_status(id, OrderStatus::Cancelled)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => OrderError::CannotCancel(order.status),
                RepositoryError::NotFound => OrderError::NotFound,
                other => other.into(),
            })
    }
}
