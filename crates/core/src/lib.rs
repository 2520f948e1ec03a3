//! Café Amka Core - Domain library.
//!
//! This crate provides the ordering rules shared by every Café Amka component:
//! - `storefront` - Customer-facing JSON API
//! - `cli` - Command-line tools for migrations, seeding and order handling
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Every figure the customer sees (line totals, fees,
//! points) is computed here so the server and the tests agree on one source.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, contact details and statuses
//! - [`menu`] - Menu items and their customization option groups
//! - [`pricing`] - Customization selection and price calculation
//! - [`cart`] - Keyed cart store with derived totals
//! - [`summary`] - Order summary (fees, total, points earned)
//! - [`checkout`] - Checkout gate validation
//! - [`loyalty`] - Tiers, rewards and bonus points
//! - [`reservation`] - Table reservation rules and slot availability

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod loyalty;
pub mod menu;
pub mod pricing;
pub mod reservation;
pub mod summary;
pub mod types;

pub use cart::{Cart, CartError, CartLineItem, LineKey};
pub use checkout::{
    CheckoutGate, CheckoutIssue, CheckoutPlan, CheckoutRequest, ContactPreference,
    DeliveryDetails, DeliveryTiming,
};
pub use loyalty::{LoyaltyError, Reward, Tier, TierProgress};
pub use menu::{Category, Choice, MenuItem, OptionGroup, SelectionKind};
pub use pricing::{Customizations, PricingError, SelectedOption};
pub use reservation::{
    Availability, ReservationError, ReservationRequest, SeatingArea, SlotOccupancy,
    ValidReservation,
};
pub use summary::{OrderSummary, PricingPolicy};
pub use types::*;
