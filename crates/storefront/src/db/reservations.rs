//! Reservation repository.
//!
//! Capacity is counted per date, slot and seating area over active
//! (pending or confirmed) bookings. Booking takes a transaction-scoped
//! advisory lock on the slot so two parties cannot both claim the last seats.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{PgPool, Postgres};
use tracing::instrument;

use cafe_amka_core::reservation::{self, SeatingArea};
use cafe_amka_core::{
    Availability, ReservationId, ReservationStatus, SlotOccupancy, UserId, ValidReservation,
};

use super::RepositoryError;
use crate::models::Reservation;

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: ReservationId,
    user_id: UserId,
    reservation_date: NaiveDate,
    reservation_time: NaiveTime,
    guests: i16,
    seating_area: SeatingArea,
    customer_name: String,
    customer_phone: String,
    customer_email: String,
    special_requests: Option<String>,
    status: ReservationStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = RepositoryError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let guests = u8::try_from(row.guests).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "reservation {} has invalid party size {}",
                row.id, row.guests
            ))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            reservation_date: row.reservation_date,
            reservation_time: row.reservation_time,
            guests,
            seating_area: row.seating_area,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            customer_email: row.customer_email,
            special_requests: row.special_requests,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OccupancyRow {
    reservation_time: NaiveTime,
    reservations: i64,
    guests: i64,
}

impl TryFrom<OccupancyRow> for SlotOccupancy {
    type Error = RepositoryError;

    fn try_from(row: OccupancyRow) -> Result<Self, Self::Error> {
        let convert = |value: i64, what: &str| {
            u32::try_from(value).map_err(|_| {
                RepositoryError::DataCorruption(format!("{what} out of range: {value}"))
            })
        };

        Ok(Self {
            reservations: convert(row.reservations, "reservation count")?,
            guests: convert(row.guests, "guest count")?,
        })
    }
}

/// Outcome of a booking attempt.
#[derive(Debug, Clone)]
pub enum Booking {
    Created(Reservation),
    Rejected(Availability),
}

const RESERVATION_COLUMNS: &str = r"
    id, user_id, reservation_date, reservation_time, guests, seating_area,
    customer_name, customer_phone, customer_email, special_requests, status,
    created_at
";

const OCCUPANCY_QUERY: &str = r"
    SELECT reservation_time,
           COUNT(*) AS reservations,
           COALESCE(SUM(guests), 0)::BIGINT AS guests
    FROM reservations
    WHERE reservation_date = $1
      AND seating_area = $2
      AND status IN ('pending', 'confirmed')
";

async fn slot_occupancy(
    executor: impl sqlx::Executor<'_, Database = Postgres>,
    date: NaiveDate,
    time: NaiveTime,
    area: SeatingArea,
) -> Result<SlotOccupancy, RepositoryError> {
    let sql = format!("{OCCUPANCY_QUERY} AND reservation_time = $3 GROUP BY reservation_time");

    sqlx::query_as::<_, OccupancyRow>(&sql)
        .bind(date)
        .bind(area)
        .bind(time)
        .fetch_optional(executor)
        .await?
        .map_or(Ok(SlotOccupancy::default()), SlotOccupancy::try_from)
}

/// Repository for table reservations.
pub struct ReservationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReservationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Occupancy of one slot in one area.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn occupancy(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        area: SeatingArea,
    ) -> Result<SlotOccupancy, RepositoryError> {
        slot_occupancy(self.pool, date, time, area).await
    }

    /// Occupancy of every booked slot on a date in one area.
    ///
    /// Slots with no active bookings are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn occupancy_for_date(
        &self,
        date: NaiveDate,
        area: SeatingArea,
    ) -> Result<BTreeMap<NaiveTime, SlotOccupancy>, RepositoryError> {
        let sql = format!("{OCCUPANCY_QUERY} GROUP BY reservation_time");

        sqlx::query_as::<_, OccupancyRow>(&sql)
            .bind(date)
            .bind(area)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(|row| {
                let time = row.reservation_time;
                SlotOccupancy::try_from(row).map(|occupancy| (time, occupancy))
            })
            .collect()
    }

    /// Book a table if the slot still has room.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, booking), fields(
        date = %booking.reservation_date,
        time = %booking.reservation_time,
        area = %booking.seating_area.as_str(),
        guests = booking.guests,
    ))]
    pub async fn book(
        &self,
        user_id: UserId,
        booking: &ValidReservation,
    ) -> Result<Booking, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!(
                "reservation:{}:{}:{}",
                booking.reservation_date,
                booking.reservation_time,
                booking.seating_area.as_str()
            ))
            .execute(&mut *tx)
            .await?;

        let occupancy = slot_occupancy(
            &mut *tx,
            booking.reservation_date,
            booking.reservation_time,
            booking.seating_area,
        )
        .await?;

        let availability = reservation::check_availability(occupancy, u32::from(booking.guests));
        if !availability.is_available() {
            return Ok(Booking::Rejected(availability));
        }

        let sql = format!(
            r"
            INSERT INTO reservations
                (user_id, reservation_date, reservation_time, guests, seating_area,
                 customer_name, customer_phone, customer_email, special_requests)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RESERVATION_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(user_id)
            .bind(booking.reservation_date)
            .bind(booking.reservation_time)
            .bind(i16::from(booking.guests))
            .bind(booking.seating_area)
            .bind(&booking.customer_name)
            .bind(booking.customer_phone.as_str())
            .bind(booking.customer_email.as_str())
            .bind(booking.special_requests.as_deref())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Reservation::try_from(row).map(Booking::Created)
    }

    /// A user's reservations, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE user_id = $1
            ORDER BY reservation_date, reservation_time
            "
        );

        sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Reservation::try_from)
            .collect()
    }

    /// Cancel one of the user's active reservations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such reservation.
    /// Returns `RepositoryError::Conflict` if it is already cancelled or completed.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cancel(
        &self,
        user_id: UserId,
        id: ReservationId,
    ) -> Result<Reservation, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let status: ReservationStatus = sqlx::query_scalar(
            "SELECT status FROM reservations WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !status.is_active() {
            return Err(RepositoryError::Conflict(
                "reservation is no longer active".to_owned(),
            ));
        }

        let sql = format!(
            r"
            UPDATE reservations SET status = 'cancelled', updated_at = now()
            WHERE id = $1
            RETURNING {RESERVATION_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Reservation::try_from(row)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_occupancy_row_converts() {
        let occupancy = SlotOccupancy::try_from(OccupancyRow {
            reservation_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            reservations: 2,
            guests: 11,
        })
        .unwrap();

        assert_eq!(
            occupancy,
            SlotOccupancy {
                reservations: 2,
                guests: 11
            }
        );
    }

    #[test]
    fn test_negative_party_size_is_corruption() {
        let row = ReservationRow {
            id: ReservationId::generate(),
            user_id: UserId::generate(),
            reservation_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            reservation_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            guests: -2,
            seating_area: SeatingArea::Any,
            customer_name: "Wanjiru".to_owned(),
            customer_phone: "0712345678".to_owned(),
            customer_email: "wanjiru@example.com".to_owned(),
            special_requests: None,
            status: ReservationStatus::Pending,
            created_at: Utc::now(),
        };

        assert!(matches!(
            Reservation::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
