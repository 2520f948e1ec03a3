//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use cafe_amka_core::CheckoutGate;

use crate::config::CafeConfig;
use crate::services::{MenuCatalog, PaymentGateway};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CafeConfig,
    pool: PgPool,
    menu: MenuCatalog,
    payments: PaymentGateway,
    gate: CheckoutGate,
}

impl AppState {
    /// Build the state from configuration and a connection pool.
    #[must_use]
    pub fn new(config: CafeConfig, pool: PgPool) -> Self {
        let menu = MenuCatalog::new(pool.clone(), config.menu_cache_ttl);
        let payments = PaymentGateway::new(config.payment_delay);
        let gate = CheckoutGate::new(config.pricing);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                menu,
                payments,
                gate,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CafeConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Cached menu catalogue.
    #[must_use]
    pub fn menu(&self) -> &MenuCatalog {
        &self.inner.menu
    }

    #[must_use]
    pub fn payments(&self) -> &PaymentGateway {
        &self.inner.payments
    }

    /// Checkout gate configured with the café's fees.
    #[must_use]
    pub fn gate(&self) -> CheckoutGate {
        self.inner.gate
    }
}
