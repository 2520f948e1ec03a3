//! Booking rules across a whole day, and points across a customer's orders.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use cafe_amka_core::loyalty::{TOP_UP_BONUS_POINTS, top_up_bonus};
use cafe_amka_core::reservation::{
    MAX_GUESTS_PER_AREA, MAX_PARTY_SIZE, MAX_RESERVATIONS_PER_SLOT, available_slots,
    check_availability, time_slots,
};
use cafe_amka_core::{
    Availability, LoyaltyError, Money, OrderSummary, OrderType, PricingPolicy,
    ReservationError, ReservationRequest, Reward, SeatingArea, SlotOccupancy, Tier,
    TierProgress,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn booking(guests: u8) -> ReservationRequest {
    ReservationRequest {
        reservation_date: today(),
        reservation_time: at(13, 0),
        guests,
        seating_area: SeatingArea::Outdoor,
        customer_name: "Wanjiru Kamau".to_owned(),
        customer_phone: "+254 722 000 111".to_owned(),
        customer_email: "wanjiru@example.co.ke".to_owned(),
        special_requests: Some("High chair please".to_owned()),
    }
}

// =============================================================================
// Reservations
// =============================================================================

#[test]
fn test_slot_fills_up_booking_by_booking() {
    let mut parties: Vec<u32> = Vec::new();

    for _ in 0..MAX_RESERVATIONS_PER_SLOT {
        let occupancy = SlotOccupancy::from_party_sizes(parties.iter().copied());
        assert_eq!(check_availability(occupancy, 4), Availability::Available);
        parties.push(4);
    }

    let occupancy = SlotOccupancy::from_party_sizes(parties.iter().copied());
    assert_eq!(occupancy.reservations, MAX_RESERVATIONS_PER_SLOT);
    assert_eq!(check_availability(occupancy, 1), Availability::FullyBooked);
}

#[test]
fn test_large_parties_hit_guest_limit_first() {
    // Two full tables leave room for one more party, but not a big one
    let occupancy = SlotOccupancy::from_party_sizes([8, 8]);
    let room = MAX_GUESTS_PER_AREA - occupancy.guests;

    assert_eq!(
        check_availability(occupancy, room),
        Availability::Available
    );
    assert_eq!(
        check_availability(occupancy, room + 1),
        Availability::InsufficientCapacity
    );
}

#[test]
fn test_available_slots_for_a_busy_day() {
    let mut occupied = BTreeMap::new();
    occupied.insert(at(12, 30), SlotOccupancy::from_party_sizes([2, 2, 2]));
    occupied.insert(at(13, 0), SlotOccupancy::from_party_sizes([8, 8, 6]));
    occupied.insert(at(13, 30), SlotOccupancy::from_party_sizes([8, 8]));

    let for_two = available_slots(&occupied, 2);
    assert_eq!(for_two.len(), time_slots().len() - 2);
    assert!(!for_two.contains(&at(12, 30)));
    assert!(!for_two.contains(&at(13, 0)));
    assert!(for_two.contains(&at(13, 30)));

    let for_eight = available_slots(&occupied, 8);
    assert!(!for_eight.contains(&at(13, 30)));
    assert!(for_eight.contains(&at(9, 0)));
}

#[test]
fn test_valid_booking_is_normalised() {
    let valid = booking(4).validate(today()).unwrap();
    assert_eq!(valid.customer_phone.as_str(), "+254722000111");
    assert_eq!(valid.seating_area, SeatingArea::Outdoor);
    assert_eq!(valid.special_requests.as_deref(), Some("High chair please"));
}

#[test]
fn test_booking_rules() {
    let yesterday = today().pred_opt().unwrap();

    let mut past = booking(2);
    past.reservation_date = yesterday;
    assert_eq!(past.validate(today()), Err(ReservationError::DateInPast));

    let mut off_grid = booking(2);
    off_grid.reservation_time = at(20, 0);
    assert_eq!(
        off_grid.validate(today()),
        Err(ReservationError::UnknownTimeSlot(at(20, 0)))
    );

    assert_eq!(
        booking(0).validate(today()),
        Err(ReservationError::InvalidPartySize)
    );
    assert_eq!(
        booking(MAX_PARTY_SIZE + 1).validate(today()),
        Err(ReservationError::InvalidPartySize)
    );
    assert!(booking(MAX_PARTY_SIZE).validate(today()).is_ok());

    let mut nameless = booking(2);
    nameless.customer_name = "   ".to_owned();
    assert_eq!(
        nameless.validate(today()),
        Err(ReservationError::MissingName)
    );

    let mut bad_phone = booking(2);
    bad_phone.customer_phone = "call me".to_owned();
    assert!(matches!(
        bad_phone.validate(today()),
        Err(ReservationError::Phone(_))
    ));

    let mut bad_email = booking(2);
    bad_email.customer_email = "wanjiru.example".to_owned();
    assert!(matches!(
        bad_email.validate(today()),
        Err(ReservationError::Email(_))
    ));
}

// =============================================================================
// Loyalty
// =============================================================================

#[test]
fn test_points_from_orders_climb_tiers() {
    let policy = PricingPolicy::default();
    let mut points = 0u32;

    // Each delivery order of 4,800 comes to 5,000 and earns 50 points
    for order in 1..=10u32 {
        let summary = OrderSummary::from_subtotal(
            Money::from_shillings(4800),
            OrderType::Delivery,
            &policy,
        );
        assert_eq!(summary.total, Money::from_shillings(5000));
        points += summary.points_earned;

        let expected = match order * 50 {
            0..250 => Tier::Bronze,
            250..500 => Tier::Silver,
            _ => Tier::Gold,
        };
        assert_eq!(Tier::for_points(points), expected);
    }

    assert_eq!(points, 500);
    let progress = TierProgress::for_points(points);
    assert_eq!(progress.tier, Tier::Gold);
    assert_eq!(progress.next_tier, Some(Tier::Platinum));
    assert_eq!(progress.points_to_next, 500);
    assert_eq!(progress.percent, 0);
}

#[test]
fn test_spending_points_on_rewards() {
    let mut points = 120;
    assert_eq!(Reward::next_for(points), Some((Reward::FreePastry, 30)));

    points = Reward::FreeCoffee.redeem(points).unwrap();
    assert_eq!(points, 20);
    assert_eq!(Reward::next_for(points), Some((Reward::FreeCoffee, 80)));

    assert_eq!(
        Reward::LunchSpecial.redeem(points),
        Err(LoyaltyError::InsufficientPoints {
            reward: "Lunch Special",
            needed: 300,
            available: 20,
        })
    );

    assert_eq!("lunch-special".parse::<Reward>(), Ok(Reward::LunchSpecial));
    assert!(matches!(
        "free-cake".parse::<Reward>(),
        Err(LoyaltyError::UnknownReward(_))
    ));
}

#[test]
fn test_top_up_bonus_threshold() {
    assert_eq!(top_up_bonus(Money::from_shillings(999)), 0);
    assert_eq!(
        top_up_bonus(Money::from_shillings(1000)),
        TOP_UP_BONUS_POINTS
    );
    assert_eq!(
        top_up_bonus(Money::from_shillings(5000)),
        TOP_UP_BONUS_POINTS
    );
}
