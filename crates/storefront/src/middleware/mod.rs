//! Request middleware for the ordering API.
//!
//! `app()` applies these outermost first: Sentry, `TraceLayer`, request ids,
//! security headers, the session store, and finally per-client rate limits.
//! `/auth` gets a tighter limit than the rest of `/api`.
//!
//! The [`auth`] extractors read the customer out of the session and are used
//! by handlers directly rather than as a layer.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
