//! Domain models for the storefront.
//!
//! These are validated types handed out by the repositories and serialized
//! in API responses. Database row types stay private to `db`.

pub mod order;
pub mod profile;
pub mod reservation;
pub mod session;
pub mod user;
pub mod wallet;

pub use order::{Order, OrderDetail, OrderItem};
pub use profile::{NotificationPreferences, Profile, ProfileUpdate};
pub use reservation::Reservation;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
pub use wallet::{Transaction, Wallet};
