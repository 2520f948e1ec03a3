//! Reservation route handlers.
//!
//! Availability is public so the booking form can show free slots before
//! sign-in. Creating, listing and cancelling require a customer.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::instrument;

use cafe_amka_core::reservation::SeatingArea;
use cafe_amka_core::{ReservationId, ReservationRequest};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Reservation;
use crate::services::{ReservationService, SlotAvailability};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub guests: u8,
    #[serde(default)]
    pub seating_area: SeatingArea,
}

/// The café's calendar date.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// GET /api/reservations/availability
#[instrument(skip(state))]
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<SlotAvailability>> {
    let slots = ReservationService::new(state.pool())
        .availability(query.date, query.guests, query.seating_area, today())
        .await?;
    Ok(Json(slots))
}

/// GET /api/reservations
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Reservation>>> {
    Ok(Json(ReservationService::new(state.pool()).list(&user).await?))
}

/// POST /api/reservations
///
/// Responds `409 Conflict` when the slot is already full.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>)> {
    let reservation = ReservationService::new(state.pool())
        .create(&user, body, today())
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// POST /api/reservations/{id}/cancel
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ReservationId>,
) -> Result<Json<Reservation>> {
    Ok(Json(
        ReservationService::new(state.pool()).cancel(&user, id).await?,
    ))
}
