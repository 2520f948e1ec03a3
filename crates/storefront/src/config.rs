//! Café Amka API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CAFE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `CAFE_BASE_URL` - Public URL the API is served from
//! - `CAFE_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `CAFE_HOST` - Bind address (default: 127.0.0.1)
//! - `CAFE_PORT` - Listen port (default: 3000)
//! - `CAFE_PAYMENT_DELAY_MS` - Simulated payment processing delay (default: 2000)
//! - `CAFE_MENU_CACHE_TTL_SECS` - Menu cache lifetime (default: 300)
//! - `CAFE_SESSION_IDLE_HOURS` - Idle time before a session expires (default: 168)
//! - `CAFE_SERVICE_FEE` - Flat service fee in KSh (default: 50)
//! - `CAFE_DELIVERY_FEE` - Delivery fee in KSh (default: 150)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use cafe_amka_core::{Money, PricingPolicy};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
/// 90 days
const MAX_SESSION_IDLE_HOURS: u64 = 90 * 24;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CafeConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL; an `https` scheme turns on secure cookies
    pub base_url: String,
    pub session_secret: SecretString,
    /// How long the simulated payment gateway takes to answer
    pub payment_delay: Duration,
    pub menu_cache_ttl: Duration,
    /// Sessions untouched for this long are dropped, carts included
    pub session_idle: Duration,
    /// Service and delivery fees
    pub pricing: PricingPolicy,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for CafeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CafeConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("session_secret", &"[REDACTED]")
            .field("payment_delay", &self.payment_delay)
            .field("menu_cache_ttl", &self.menu_cache_ttl)
            .field("session_idle", &self.session_idle)
            .field("pricing", &self.pricing)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[SET]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl CafeConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CAFE_DATABASE_URL")?;
        let host: IpAddr = parse_env_or_default("CAFE_HOST", "127.0.0.1")?;
        let port: u16 = parse_env_or_default("CAFE_PORT", "3000")?;
        let base_url = get_required_env("CAFE_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CAFE_BASE_URL".to_string(), e.to_string()))?;
        let session_secret = get_validated_secret("CAFE_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "CAFE_SESSION_SECRET")?;

        let payment_delay =
            Duration::from_millis(parse_env_or_default("CAFE_PAYMENT_DELAY_MS", "2000")?);
        let menu_cache_ttl =
            Duration::from_secs(parse_env_or_default("CAFE_MENU_CACHE_TTL_SECS", "300")?);
        let idle_hours: u64 = parse_env_or_default("CAFE_SESSION_IDLE_HOURS", "168")?;
        if !(1..=MAX_SESSION_IDLE_HOURS).contains(&idle_hours) {
            return Err(ConfigError::InvalidEnvVar(
                "CAFE_SESSION_IDLE_HOURS".to_string(),
                format!("must be between 1 and {MAX_SESSION_IDLE_HOURS}"),
            ));
        }
        let session_idle = Duration::from_secs(idle_hours * 60 * 60);

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            service_fee: Money::from_shillings(parse_env_or_default(
                "CAFE_SERVICE_FEE",
                &PricingPolicy::DEFAULT_SERVICE_FEE.to_string(),
            )?),
            delivery_fee: Money::from_shillings(parse_env_or_default(
                "CAFE_DELIVERY_FEE",
                &PricingPolicy::DEFAULT_DELIVERY_FEE.to_string(),
            )?),
            ..defaults
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            payment_delay,
            menu_cache_ttl,
            session_idle,
            pricing,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
