//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration and password login
//! - `menu` - Cached menu catalogue
//! - `orders` - Checkout, order history and cancellation
//! - `payment` - Simulated payment gateway
//! - `reservations` - Table bookings with capacity checks
//! - `wallet` - Wallet top-ups, reward redemption and loyalty overview

pub mod auth;
pub mod menu;
pub mod orders;
pub mod payment;
pub mod reservations;
pub mod wallet;

pub use auth::{AuthError, AuthService, NewAccount};
pub use menu::{Menu, MenuCatalog, MenuError};
pub use orders::{CheckoutChoice, OrderError, OrderService};
pub use payment::{PaymentError, PaymentGateway, PaymentReceipt};
pub use reservations::{BookingError, ReservationService, SlotAvailability};
pub use wallet::{LoyaltyOverview, Redemption, WalletError, WalletOverview, WalletService};
