//! Errors from registering and signing in customers.

use thiserror::Error;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] cafe_amka_core::EmailError),

    /// Wrong password, or no account for the email. The two are not
    /// distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session points at an account that no longer exists.
    #[error("customer not found")]
    UserNotFound,

    #[error("an account with this email already exists")]
    UserAlreadyExists,

    #[error("{0}")]
    WeakPassword(String),

    /// Registration `password_confirm` differs from `password`.
    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing error")]
    PasswordHash,
}
