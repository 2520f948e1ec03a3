//! Table reservation rules.
//!
//! The café takes bookings on half-hour slots from 09:00 to 19:30. Each
//! seating area holds a limited number of bookings and guests per slot;
//! availability is a linear check over the active bookings already in that
//! slot.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::types::{Email, EmailError, Phone, PhoneError};

/// Active bookings allowed in one slot for one area.
pub const MAX_RESERVATIONS_PER_SLOT: u32 = 3;
/// Guests allowed in one slot for one area.
pub const MAX_GUESTS_PER_AREA: u32 = 30;
pub const MIN_PARTY_SIZE: u8 = 1;
pub const MAX_PARTY_SIZE: u8 = 8;

const FIRST_SLOT_MINUTES: u32 = 9 * 60;
const LAST_SLOT_MINUTES: u32 = 19 * 60 + 30;
const SLOT_STEP_MINUTES: u32 = 30;

/// A named table zone. Capacity is tracked per area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "seating_area", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum SeatingArea {
    /// No preference. Booked as its own zone.
    #[default]
    Any,
    Window,
    Outdoor,
    Quiet,
}

impl SeatingArea {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Window => "window",
            Self::Outdoor => "outdoor",
            Self::Quiet => "quiet",
        }
    }
}

impl std::fmt::Display for SeatingArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every bookable slot of the day, earliest first.
#[must_use]
pub fn time_slots() -> Vec<NaiveTime> {
    (FIRST_SLOT_MINUTES..=LAST_SLOT_MINUTES)
        .step_by(SLOT_STEP_MINUTES as usize)
        .filter_map(|minutes| NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0))
        .collect()
}

#[must_use]
pub fn is_valid_slot(time: NaiveTime) -> bool {
    time_slots().contains(&time)
}

/// Active bookings already in one slot for one area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotOccupancy {
    pub reservations: u32,
    pub guests: u32,
}

impl SlotOccupancy {
    /// Tally a slot from the party sizes of its active bookings.
    #[must_use]
    pub fn from_party_sizes<I>(sizes: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        sizes.into_iter().fold(Self::default(), |acc, guests| Self {
            reservations: acc.reservations.saturating_add(1),
            guests: acc.guests.saturating_add(guests),
        })
    }
}

/// Outcome of an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    FullyBooked,
    InsufficientCapacity,
}

impl Availability {
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    /// Customer-facing explanation.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Available => "This time slot is available.",
            Self::FullyBooked => "This time slot is fully booked. Please choose another time.",
            Self::InsufficientCapacity => {
                "Not enough capacity for this group size at this time. Please choose another time or reduce party size."
            }
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Can a party of `guests` join a slot with this occupancy?
#[must_use]
pub const fn check_availability(occupancy: SlotOccupancy, guests: u32) -> Availability {
    if occupancy.reservations >= MAX_RESERVATIONS_PER_SLOT {
        return Availability::FullyBooked;
    }
    if occupancy.guests.saturating_add(guests) > MAX_GUESTS_PER_AREA {
        return Availability::InsufficientCapacity;
    }
    Availability::Available
}

/// Slots that can still take a party of `guests`.
///
/// Slots missing from `occupied` are empty.
#[must_use]
pub fn available_slots(occupied: &BTreeMap<NaiveTime, SlotOccupancy>, guests: u32) -> Vec<NaiveTime> {
    time_slots()
        .into_iter()
        .filter(|slot| {
            let occupancy = occupied.get(slot).copied().unwrap_or_default();
            check_availability(occupancy, guests).is_available()
        })
        .collect()
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    #[error("reservation date cannot be in the past")]
    DateInPast,
    #[error("{0} is not a bookable time slot")]
    UnknownTimeSlot(NaiveTime),
    #[error("party size must be between 1 and 8")]
    InvalidPartySize,
    #[error("name is required")]
    MissingName,
    #[error(transparent)]
    Phone(#[from] PhoneError),
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error("{0}")]
    Unavailable(Availability),
}

/// A booking as submitted by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub guests: u8,
    #[serde(default)]
    pub seating_area: SeatingArea,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    #[serde(default)]
    pub special_requests: Option<String>,
}

/// A booking whose fields have all been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReservation {
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub guests: u8,
    pub seating_area: SeatingArea,
    pub customer_name: String,
    pub customer_phone: Phone,
    pub customer_email: Email,
    pub special_requests: Option<String>,
}

impl ReservationRequest {
    /// Check the request against the booking rules. Capacity is checked
    /// separately, against the slot's current occupancy.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReservationError`] found.
    pub fn validate(self, today: NaiveDate) -> Result<ValidReservation, ReservationError> {
        if self.reservation_date < today {
            return Err(ReservationError::DateInPast);
        }
        if !is_valid_slot(self.reservation_time) {
            return Err(ReservationError::UnknownTimeSlot(self.reservation_time));
        }
        if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&self.guests) {
            return Err(ReservationError::InvalidPartySize);
        }

        let customer_name = self.customer_name.trim().to_owned();
        if customer_name.is_empty() {
            return Err(ReservationError::MissingName);
        }

        Ok(ValidReservation {
            reservation_date: self.reservation_date,
            reservation_time: self.reservation_time,
            guests: self.guests,
            seating_area: self.seating_area,
            customer_name,
            customer_phone: Phone::parse(&self.customer_phone)?,
            customer_email: Email::parse(&self.customer_email)?,
            special_requests: self
                .special_requests
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn request() -> ReservationRequest {
        ReservationRequest {
            reservation_date: today(),
            reservation_time: at(12, 30),
            guests: 4,
            seating_area: SeatingArea::Window,
            customer_name: " Achieng Otieno ".to_owned(),
            customer_phone: "0712 345 678".to_owned(),
            customer_email: "achieng@example.co.ke".to_owned(),
            special_requests: Some("  ".to_owned()),
        }
    }

    #[test]
    fn test_twenty_two_half_hour_slots() {
        let slots = time_slots();
        assert_eq!(slots.len(), 22);
        assert_eq!(slots.first(), Some(&at(9, 0)));
        assert_eq!(slots.last(), Some(&at(19, 30)));
        assert!(!is_valid_slot(at(20, 0)));
        assert!(!is_valid_slot(at(9, 15)));
    }

    #[test]
    fn test_fully_booked_after_three() {
        let occupancy = SlotOccupancy::from_party_sizes([2, 2, 2]);
        assert_eq!(check_availability(occupancy, 1), Availability::FullyBooked);
    }

    #[test]
    fn test_capacity_limit() {
        let occupancy = SlotOccupancy::from_party_sizes([8, 8]);
        assert_eq!(check_availability(occupancy, 8), Availability::InsufficientCapacity);
        assert_eq!(check_availability(occupancy, 6), Availability::Available);
    }

    #[test]
    fn test_available_slots_skips_full_ones() {
        let mut occupied = BTreeMap::new();
        occupied.insert(at(12, 0), SlotOccupancy::from_party_sizes([2, 2, 2]));
        occupied.insert(at(12, 30), SlotOccupancy::from_party_sizes([8, 8, 8]));
        let free = available_slots(&occupied, 2);
        assert_eq!(free.len(), 20);
        assert!(!free.contains(&at(12, 0)));
        assert!(!free.contains(&at(12, 30)));
    }

    #[test]
    fn test_validate_normalises() {
        let valid = request().validate(today()).unwrap();
        assert_eq!(valid.customer_name, "Achieng Otieno");
        assert_eq!(valid.customer_phone.as_str(), "0712345678");
        assert_eq!(valid.special_requests, None);
    }

    #[test]
    fn test_validate_rejections() {
        let past = ReservationRequest {
            reservation_date: today().pred_opt().unwrap(),
            ..request()
        };
        assert_eq!(past.validate(today()), Err(ReservationError::DateInPast));

        let odd_slot = ReservationRequest {
            reservation_time: at(8, 30),
            ..request()
        };
        assert!(matches!(
            odd_slot.validate(today()),
            Err(ReservationError::UnknownTimeSlot(_))
        ));

        for guests in [0, 9] {
            let r = ReservationRequest { guests, ..request() };
            assert_eq!(r.validate(today()), Err(ReservationError::InvalidPartySize));
        }

        let nameless = ReservationRequest {
            customer_name: "   ".to_owned(),
            ..request()
        };
        assert_eq!(nameless.validate(today()), Err(ReservationError::MissingName));

        let bad_email = ReservationRequest {
            customer_email: "achieng".to_owned(),
            ..request()
        };
        assert!(matches!(
            bad_email.validate(today()),
            Err(ReservationError::Email(_))
        ));
    }

    #[test]
    fn test_unavailable_error_uses_customer_message() {
        let err = ReservationError::Unavailable(Availability::FullyBooked);
        assert_eq!(
            err.to_string(),
            "This time slot is fully booked. Please choose another time."
        );
    }
}
