//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server errors are captured to
//! Sentry before responding. Every response body is JSON of the form
//! `{ "error": "..." }`. Checkout rejections also carry an `issues` list.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use cafe_amka_core::{CartError, CheckoutIssue, LoyaltyError, ReservationError};

use crate::db::RepositoryError;
use crate::services::{AuthError, BookingError, MenuError, OrderError, PaymentError, WalletError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout gate rejected the order.
    #[error("Checkout rejected")]
    Checkout(Vec<CheckoutIssue>),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Reservation error: {0}")]
    Reservation(#[from] ReservationError),

    #[error("Loyalty error: {0}")]
    Loyalty(#[from] LoyaltyError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request conflicts with the resource's current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<MenuError> for AppError {
    fn from(err: MenuError) -> Self {
        match err {
            MenuError::Repository(e) => Self::Database(e),
            MenuError::ItemNotFound(id) => Self::NotFound(format!("menu item {id}")),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Checkout(issues) => Self::Checkout(issues),
            OrderError::Payment(e) => Self::Payment(e),
            OrderError::NotFound => Self::NotFound("order".to_owned()),
            OrderError::CannotCancel(_) | OrderError::CannotAdvance(_) => {
                Self::Conflict(err.to_string())
            }
            OrderError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Invalid(e) => Self::Reservation(e),
            BookingError::NotFound => Self::NotFound("reservation".to_owned()),
            BookingError::NotActive => Self::Conflict(err.to_string()),
            BookingError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotFound => Self::NotFound("wallet".to_owned()),
            WalletError::InvalidTopUpAmount | WalletError::UnsupportedTopUpMethod(_) => {
                Self::BadRequest(err.to_string())
            }
            WalletError::Loyalty(e) => Self::Loyalty(e),
            WalletError::Payment(e) => Self::Payment(e),
            WalletError::Repository(e) => Self::Database(e),
        }
    }
}

impl AppError {
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ) | Self::Internal(_)
                | Self::Session(_)
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(CartError::LineNotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Cart(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Reservation(ReservationError::Unavailable(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Checkout(_) | Self::Reservation(_) | Self::Loyalty(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Payment(_) => StatusCode::PAYMENT_REQUIRED,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                "Internal server error".to_owned()
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_owned()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_owned()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::PasswordMismatch => "Passwords do not match".to_owned(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_owned()
                }
            },
            Self::Cart(err) => err.to_string(),
            Self::Checkout(_) => "Checkout cannot be completed".to_owned(),
            Self::Payment(err) => err.to_string(),
            Self::Reservation(ReservationError::Unavailable(availability)) => {
                availability.message().to_owned()
            }
            Self::Reservation(err) => err.to_string(),
            Self::Loyalty(err) => err.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Conflict(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let message = self.message();

        let body = match self {
            Self::Checkout(issues) => json!({ "error": message, "issues": issues }),
            _ => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for customer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("menu_item_id", "…")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use cafe_amka_core::{Availability, LineKey, Money};

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        fn status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(status(AppError::NotFound("order".to_owned())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::BadRequest("bad".to_owned())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AppError::Checkout(vec![CheckoutIssue::EmptyCart])),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(AppError::Reservation(ReservationError::Unavailable(
                Availability::FullyBooked
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Cart(CartError::LineNotFound(LineKey::compute(
                cafe_amka_core::MenuItemId::generate(),
                &cafe_amka_core::Customizations::new(),
                None,
            )))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Auth(AuthError::PasswordMismatch)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_checkout_body_lists_issues() {
        let response = AppError::Checkout(vec![
            CheckoutIssue::TermsNotAccepted,
            CheckoutIssue::InsufficientWalletBalance {
                required: Money::from_shillings(760),
                available: Money::from_shillings(500),
            },
        ])
        .into_response();

        let body = body_json(response).await;
        let issues = body["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0]["code"], "terms_not_accepted");
        assert_eq!(issues[1]["code"], "insufficient_wallet_balance");
        assert_eq!(issues[1]["required"], "760");
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let body = body_json(AppError::Internal("pool exhausted".to_owned()).into_response()).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_unavailable_slot_message() {
        let body = body_json(
            AppError::Reservation(ReservationError::Unavailable(Availability::FullyBooked))
                .into_response(),
        )
        .await;
        assert_eq!(
            body["error"],
            "This time slot is fully booked. Please choose another time."
        );
    }
}
