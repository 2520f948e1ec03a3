//! Simulated payment gateway.
//!
//! Every supported method succeeds after a configurable delay and returns a
//! reference of the form `txn_<unix millis>_<9 base-36 chars>`. Wallet
//! payments are settled against the wallet when the order is persisted, not
//! here.

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tracing::{info, instrument};

use cafe_amka_core::{Money, PaymentMethod, UserId};

/// Payment failures.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment amount must be positive")]
    InvalidAmount,
}

/// Proof of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub method: PaymentMethod,
    pub amount: Money,
}

/// Payment processor used at checkout and for wallet top-ups.
#[derive(Debug, Clone)]
pub struct PaymentGateway {
    delay: Duration,
}

impl PaymentGateway {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Charge `amount` using `method`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` for zero or negative amounts.
    #[instrument(skip(self), fields(amount = %amount))]
    pub async fn charge(
        &self,
        user_id: UserId,
        method: PaymentMethod,
        amount: Money,
    ) -> Result<PaymentReceipt, PaymentError> {
        if amount <= Money::ZERO {
            return Err(PaymentError::InvalidAmount);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let transaction_id = transaction_reference(Utc::now().timestamp_millis());
        info!(%transaction_id, "Payment processed");

        Ok(PaymentReceipt {
            transaction_id,
            method,
            amount,
        })
    }
}

fn transaction_reference(millis: i64) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect();
    format!("txn_{millis}_{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_shape() {
        let reference = transaction_reference(1_767_225_600_000);
        let suffix = reference.strip_prefix("txn_1767225600000_").unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[tokio::test]
    async fn test_charge_succeeds_for_every_method() {
        let gateway = PaymentGateway::new(Duration::ZERO);
        for method in [
            PaymentMethod::Wallet,
            PaymentMethod::Mpesa,
            PaymentMethod::Card,
            PaymentMethod::Paylater,
        ] {
            let receipt = gateway
                .charge(UserId::generate(), method, Money::from_shillings(760))
                .await
                .unwrap();
            assert_eq!(receipt.method, method);
            assert!(receipt.transaction_id.starts_with("txn_"));
        }
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let gateway = PaymentGateway::new(Duration::ZERO);
        assert!(matches!(
            gateway
                .charge(UserId::generate(), PaymentMethod::Card, Money::ZERO)
                .await,
            Err(PaymentError::InvalidAmount)
        ));
    }
}
