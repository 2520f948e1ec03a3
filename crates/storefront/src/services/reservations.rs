//! Table reservations.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use cafe_amka_core::reservation::{self, MAX_PARTY_SIZE, MIN_PARTY_SIZE, SeatingArea};
use cafe_amka_core::{ReservationError, ReservationId, ReservationRequest};

use crate::db::reservations::Booking;
use crate::db::{RepositoryError, ReservationRepository};
use crate::models::{CurrentUser, Reservation};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Invalid(#[from] ReservationError),

    #[error("reservation not found")]
    NotFound,

    #[error("reservation is no longer active")]
    NotActive,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Free slots on one date for one party.
#[derive(Debug, Clone, Serialize)]
pub struct SlotAvailability {
    pub date: NaiveDate,
    pub seating_area: SeatingArea,
    pub guests: u8,
    pub available_slots: Vec<NaiveTime>,
}

pub struct ReservationService<'a> {
    reservations: ReservationRepository<'a>,
}

impl<'a> ReservationService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            reservations: ReservationRepository::new(pool),
        }
    }

    /// Validate and book a table.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Invalid` if the request breaks a booking rule,
    /// including `ReservationError::Unavailable` when the slot is full.
    #[instrument(skip(self, request), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        request: ReservationRequest,
        today: NaiveDate,
    ) -> Result<Reservation, BookingError> {
        let valid = request.validate(today)?;

        match self.reservations.book(user.id, &valid).await? {
            Booking::Created(reservation) => {
                info!(reservation_id = %reservation.id, "Reservation created");
                Ok(reservation)
            }
            Booking::Rejected(availability) => {
                Err(ReservationError::Unavailable(availability).into())
            }
        }
    }

    /// Slots on `date` that can still seat `guests` in `area`.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Invalid` for a past date or a party size out of range.
    pub async fn availability(
        &self,
        date: NaiveDate,
        guests: u8,
        area: SeatingArea,
        today: NaiveDate,
    ) -> Result<SlotAvailability, BookingError> {
        if date < today {
            return Err(ReservationError::DateInPast.into());
        }
        if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&guests) {
            return Err(ReservationError::InvalidPartySize.into());
        }

        let occupied = self.reservations.occupancy_for_date(date, area).await?;

        Ok(SlotAvailability {
            date,
            seating_area: area,
            guests,
            available_slots: reservation::available_slots(&occupied, u32::from(guests)),
        })
    }

    /// The customer's reservations.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Repository` if the database read fails.
    pub async fn list(&self, user: &CurrentUser) -> Result<Vec<Reservation>, BookingError> {
        Ok(self.reservations.list_for_user(user.id).await?)
    }

    /// Cancel one of the customer's active reservations.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::NotFound` if the customer has no such reservation.
    /// Returns `BookingError::NotActive` if it is already cancelled or completed.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cancel(
        &self,
        user: &CurrentUser,
        id: ReservationId,
    ) -> Result<Reservation, BookingError> {
        self.reservations
            .cancel(user.id, id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => BookingError::NotFound,
                RepositoryError::Conflict(_) => BookingError::NotActive,
                other => other.into(),
            })
    }
}
