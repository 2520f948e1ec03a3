//! Café Amka Storefront - Customer ordering API.
//!
//! This binary serves the JSON API used by the café's web and mobile apps.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - `PostgreSQL` for menu, orders, wallets, reservations and sessions
//! - Cart and checkout rules from `cafe-amka-core`
//! - Simulated payment gateway (no external provider)
//!
//! Migrations are not run on startup. Apply them with `cafe-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use cafe_amka_storefront::config::CafeConfig;
use cafe_amka_storefront::state::AppState;
use cafe_amka_storefront::{app, db};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Start Sentry when a DSN is configured. The guard flushes events on drop.
fn init_sentry(config: &CafeConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Into::into),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        ..Default::default()
    };
    let guard = sentry::init((dsn, options));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Log to stdout and forward warnings to Sentry. Info and debug become breadcrumbs.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "cafe_amka_storefront=info,tower_http=debug".into()
    });

    let sentry_layer = sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let config = CafeConfig::from_env().expect("Failed to load configuration");

    // Sentry has to exist before the subscriber so its layer has a client
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    let addr = config.socket_addr();
    tracing::info!(
        service_fee = %config.pricing.service_fee,
        delivery_fee = %config.pricing.delivery_fee,
        payment_delay_ms = config.payment_delay.as_millis(),
        "Café Amka storefront configured"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "storefront listening");

    // Peer addresses feed the rate limiter when no proxy header is present
    let service = app(AppState::new(config, pool))
        .into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.expect("Failed to install Ctrl+C handler"),
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");

    tracing::info!("Shutdown signal received, draining connections");
}
