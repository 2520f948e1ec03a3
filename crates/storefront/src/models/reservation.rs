//! Reservation domain types.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use cafe_amka_core::reservation::SeatingArea;
use cafe_amka_core::{ReservationId, ReservationStatus, UserId};

/// A table booking.
#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub guests: u8,
    pub seating_area: SeatingArea,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}
