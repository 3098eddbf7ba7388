//! Booking API route handlers

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::session::SessionUser;
use crate::AppState;

use super::requests::{CalendarQuery, HistoryQuery, QuoteRequest, RoomsQuery, SubmitReservationRequest};
use super::responses::{
    CalendarResponse, HealthResponse, HistoryResponse, QuoteResponse, ReservationReceipt,
    ReservationResponse, RoomResponse,
};
use super::services;
use super::{calculators, models::ReservationStatus};

const WEEK_DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Router for everything under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/:id", get(room_detail))
        .route("/rooms/:id/calendar", get(room_calendar))
        .route("/rooms/:id/quote", post(room_quote))
        .route("/reservations", post(submit_reservation).get(reservation_history))
        .route("/reservations/:id", get(reservation_detail))
        .route("/reservations/:id/cancel", post(cancel_reservation))
        .route("/health", get(health))
}

/// Accommodation catalog, optionally filtered by category
async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<RoomsQuery>,
) -> Result<Json<Vec<RoomResponse>>> {
    let rooms = services::list_rooms(&state, query.category.as_deref()).await?;
    Ok(Json(rooms.iter().map(RoomResponse::from).collect()))
}

/// One room offering
async fn room_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RoomResponse>> {
    let room = services::load_room(&state, &id).await?;
    Ok(Json(RoomResponse::from(room.as_ref())))
}

/// The date-picker calendar for one room and month
async fn room_calendar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>> {
    let room = services::load_room(&state, &id).await?;
    let index = services::load_availability(&state.db, &room.name).await;

    let today = Utc::now().date_naive();
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Unprocessable(format!("invalid month {}/{}", month, year)))?;

    let cells = calculators::month_grid(month, year, today, &index, query.selected)
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(CalendarResponse {
        month,
        year,
        month_label: first.format("%B %Y").to_string(),
        week_days: WEEK_DAYS,
        cells,
    }))
}

/// Price a selection for one room
async fn room_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>> {
    let quote = services::quote(&state, &id, &request).await?;
    Ok(Json(QuoteResponse {
        reservable: quote.missing.is_empty(),
        missing: quote.missing,
        breakdown: quote.breakdown,
    }))
}

/// Submit a reservation for "pay on arrival"
async fn submit_reservation(
    State(state): State<AppState>,
    session: SessionUser,
    Json(request): Json<SubmitReservationRequest>,
) -> Result<Json<ReservationReceipt>> {
    let outcome = services::submit_reservation(&state, &session, &request).await?;
    let reservation = outcome.reservation;

    Ok(Json(ReservationReceipt {
        reservation_id: reservation.reservation_id,
        status: ReservationStatus::parse(&reservation.status),
        total_amount: reservation.total_amount,
        payment_method: reservation.payment_method,
        date: reservation.date,
        verification_code: reservation.verification_code,
        date_index_updated: outcome.date_index_updated,
    }))
}

/// The signed-in guest's reservation history
async fn reservation_history(
    State(state): State<AppState>,
    session: SessionUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let reservations = services::reservation_history(&state.db, &session, query.filter).await?;
    let reservations: Vec<ReservationResponse> =
        reservations.iter().map(ReservationResponse::from).collect();
    Ok(Json(HistoryResponse {
        count: reservations.len(),
        reservations,
    }))
}

/// One reservation, owner only
async fn reservation_detail(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>> {
    let reservation = services::reservation_detail(&state.db, &session, id).await?;
    Ok(Json(ReservationResponse::from(&reservation)))
}

/// Cancel a pending reservation
async fn cancel_reservation(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>> {
    let reservation = services::cancel_reservation(&state.db, &session, id).await?;
    Ok(Json(ReservationResponse::from(&reservation)))
}

/// Liveness and cache stats
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.stats(),
    })
}
