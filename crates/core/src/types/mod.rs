//! Core types for Café Amka.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod money;
pub mod order;
pub mod status;

pub use contact::{Email, EmailError, Phone, PhoneError};
pub use id::*;
pub use money::Money;
pub use order::{OrderType, PaymentMethod};
pub use status::*;
