//! Booking services with database access.
//!
//! These functions bridge the pure calculators and the persistence layer:
//! they fetch rooms and date documents, rebuild client selections through
//! the state machine, and perform the reservation writes.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::session::SessionUser;
use crate::AppState;

use super::calculators::{
    compute_total, date_doc_id, date_key, missing_fields, parse_date_key,
    build_availability_index, DateAvailabilityIndex, PriceBreakdown,
};
use super::models::{
    DateRow, DurationMode, HistoryFilter, NewReservation, Reservation, ReservationStatus,
    ReservationSummary, RoomOffering, SelectionState,
};
use super::queries;
use super::requests::{QuoteRequest, SubmitReservationRequest};

/// Load one offering, cache first
pub async fn load_room(state: &AppState, id: &str) -> Result<Arc<RoomOffering>> {
    if let Some(cached) = state.cache.rooms.get(id).await {
        tracing::debug!("Cache HIT for room: {}", id);
        return Ok(cached);
    }

    tracing::debug!("Cache MISS for room: {}", id);
    let row = queries::get_accommodation(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let room = Arc::new(row.parse());
    state.cache.rooms.insert(id.to_string(), room.clone()).await;

    Ok(room)
}

/// List offerings, optionally filtered by category, cache first
pub async fn list_rooms(
    state: &AppState,
    category: Option<&str>,
) -> Result<Arc<Vec<RoomOffering>>> {
    let key = crate::cache::AppCache::room_list_key(category);
    if let Some(cached) = state.cache.room_lists.get(&key).await {
        return Ok(cached);
    }

    let rows = queries::list_accommodations(&state.db, category).await?;
    let rooms: Arc<Vec<RoomOffering>> =
        Arc::new(rows.into_iter().map(|row| row.parse()).collect());
    state.cache.room_lists.insert(key, rooms.clone()).await;

    Ok(rooms)
}

/// Fetch the date-document scan and build the room's availability index.
///
/// A failed scan is logged and yields an empty index: unmatched dates read
/// as available and the screen stays usable.
pub async fn load_availability(db: &PgPool, room_name: &str) -> DateAvailabilityIndex {
    match queries::list_date_documents(db).await {
        Ok(rows) => {
            let documents: Vec<_> = rows.into_iter().map(DateRow::parse).collect();
            build_availability_index(&documents, room_name)
        }
        Err(e) => {
            tracing::error!("Failed to fetch date documents: {}", e);
            DateAvailabilityIndex::new()
        }
    }
}

/// Rebuild a client selection through the state machine so it obeys the
/// same rules as the screen: disabled dates stay unselected, zero-price
/// amenities stay untoggled, guests clamp to capacity, and whole-resort
/// rooms always carry the whole-resort duration.
pub fn apply_selection(
    room: &RoomOffering,
    request: &QuoteRequest,
    today: NaiveDate,
    index: &DateAvailabilityIndex,
) -> SelectionState {
    let mut selection = SelectionState::new();

    if let Some(date) = request.date {
        selection.select_date(date, today, index);
    }

    selection.duration = if room.category.is_whole_resort() {
        DurationMode::WholeResort
    } else {
        match request.duration {
            DurationMode::WholeResort => DurationMode::None,
            duration => duration,
        }
    };

    selection.set_guests(request.guests, room.effective_capacity());

    for name in &request.amenities {
        if let Some(amenity) = room.amenities.iter().find(|a| a.name == *name) {
            selection.toggle_amenity(amenity);
        }
    }

    selection
}

/// Outcome of a quote: the breakdown plus the reservability gate
pub struct Quote {
    pub breakdown: PriceBreakdown,
    pub missing: Vec<String>,
}

/// Price a selection against a stored room
pub async fn quote(state: &AppState, room_id: &str, request: &QuoteRequest) -> Result<Quote> {
    let room = load_room(state, room_id).await?;
    let index = load_availability(&state.db, &room.name).await;
    let today = Utc::now().date_naive();

    let selection = apply_selection(&room, request, today, &index);
    let breakdown = compute_total(&room, &selection);
    let missing = missing_fields(&room, &selection)
        .iter()
        .map(|f| f.as_str().to_string())
        .collect();

    Ok(Quote { breakdown, missing })
}

/// Result of a reservation submission
pub struct SubmissionOutcome {
    pub reservation: Reservation,
    /// False when the reservation was saved but the date document write
    /// failed
    pub date_index_updated: bool,
}

/// Submit a reservation for "pay on arrival".
///
/// The price is re-derived from the stored room; the client's quoted total
/// is advisory only. The write happens in two phases: the reservation
/// record first, then the date document. A phase-two failure does not roll
/// back the record - it is logged and reported on the receipt.
pub async fn submit_reservation(
    state: &AppState,
    session: &SessionUser,
    request: &SubmitReservationRequest,
) -> Result<SubmissionOutcome> {
    let room = load_room(state, &request.room_id).await?;
    if !room.active {
        return Err(AppError::Unprocessable(format!(
            "{} is currently unavailable",
            room.name
        )));
    }
    if request.payment_method.trim().is_empty() {
        return Err(AppError::Unprocessable(
            "Please select a payment method to proceed.".to_string(),
        ));
    }

    let index = load_availability(&state.db, &room.name).await;
    let today = Utc::now().date_naive();
    let selection = apply_selection(&room, &request.selection(), today, &index);

    // A requested date that did not survive the state machine was past or
    // already booked.
    if request.date.is_some() && selection.date.is_none() {
        return Err(AppError::Unprocessable(
            "The selected date is no longer available.".to_string(),
        ));
    }

    let missing = missing_fields(&room, &selection);
    if !missing.is_empty() {
        return Err(AppError::IncompleteReservation(
            missing.iter().map(|f| f.as_str().to_string()).collect(),
        ));
    }
    let Some(date) = selection.date else {
        return Err(AppError::IncompleteReservation(vec!["date".to_string()]));
    };

    let breakdown = compute_total(&room, &selection);
    if let Some(quoted) = request.quoted_total {
        if quoted != breakdown.total {
            tracing::debug!(
                "Client quote {} differs from server total {}",
                quoted,
                breakdown.total
            );
        }
    }

    let reservation_id = generate_reservation_id();
    let room_type_key = room.room_type_key();
    let wire_date = date_key(date);
    let is_whole_resort = room.category.is_whole_resort();

    let new = NewReservation {
        reservation_id: reservation_id.clone(),
        user_id: session.user_id.clone(),
        user_full_name: session.full_name.clone(),
        user_email: session.email.clone(),
        room_id: room.id.clone(),
        room_name: room.name.clone(),
        room_type_key: room_type_key.clone(),
        date: wire_date.clone(),
        guests: selection.guests,
        total_amount: breakdown.total,
        payment_method: request.payment_method.clone(),
        day_hours: duration_hours(selection.duration, DurationMode::Day),
        overnight_hours: duration_hours(selection.duration, DurationMode::Overnight),
        is_whole_resort,
        verification_code: generate_verification_code(),
    };

    let reservation = queries::insert_reservation(&state.db, &new).await?;
    tracing::info!(
        "Reservation {} saved for user {} ({} on {})",
        reservation_id,
        session.user_id,
        room.name,
        wire_date
    );

    let date_index_updated = record_reservation_date(&state.db, &reservation, date).await;

    Ok(SubmissionOutcome {
        reservation,
        date_index_updated,
    })
}

/// Phase two of the submission: append the summary to the date document.
/// Not rolled back on failure; the outcome is reported on the receipt.
async fn record_reservation_date(db: &PgPool, reservation: &Reservation, date: NaiveDate) -> bool {
    let doc_id = date_doc_id(&reservation.room_type_key, date);
    let summary = ReservationSummary {
        reservation_id: reservation.reservation_id.clone(),
        room_name: reservation.room_name.clone(),
        guests: reservation.guests,
        user_id: reservation.user_id.clone(),
        user_full_name: reservation.user_full_name.clone(),
        status: ReservationStatus::Pending,
        booked_at: Some(Utc::now()),
    };

    let summary_json = match serde_json::to_value(&summary) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                "Reservation {} saved but its summary did not serialize: {}",
                reservation.reservation_id,
                e
            );
            return false;
        }
    };

    match queries::upsert_date_reservation(
        db,
        &doc_id,
        &reservation.date,
        &reservation.date,
        &reservation.room_type_key,
        &summary_json,
    )
    .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                "Reservation {} saved but date document {} was not updated: {}",
                reservation.reservation_id,
                doc_id,
                e
            );
            false
        }
    }
}

/// The user's reservations, newest first, filtered client-style
pub async fn reservation_history(
    db: &PgPool,
    session: &SessionUser,
    filter: HistoryFilter,
) -> Result<Vec<Reservation>> {
    let reservations = queries::list_reservations_for_user(db, &session.user_id).await?;
    Ok(reservations
        .into_iter()
        .filter(|r| filter.matches(ReservationStatus::parse(&r.status)))
        .collect())
}

/// One reservation, visible to its owner only
pub async fn reservation_detail(
    db: &PgPool,
    session: &SessionUser,
    id: Uuid,
) -> Result<Reservation> {
    let reservation = queries::get_reservation(db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    if reservation.user_id != session.user_id {
        return Err(AppError::NotFound);
    }
    Ok(reservation)
}

/// Cancel a reservation. Only the owner may cancel, and only while the
/// reservation is still pending.
pub async fn cancel_reservation(
    db: &PgPool,
    session: &SessionUser,
    id: Uuid,
) -> Result<Reservation> {
    let reservation = reservation_detail(db, session, id).await?;
    if ReservationStatus::parse(&reservation.status) != ReservationStatus::Pending {
        return Err(AppError::Unprocessable(
            "Only pending reservations can be cancelled.".to_string(),
        ));
    }

    let cancelled = queries::cancel_reservation(db, id, &session.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    // Release the date in the date document as well.
    if let Some(date) = parse_date_key(&cancelled.date) {
        let doc_id = date_doc_id(&cancelled.room_type_key, date);
        if let Err(e) =
            queries::mark_date_reservation_cancelled(db, &doc_id, &cancelled.reservation_id).await
        {
            tracing::warn!(
                "Reservation {} cancelled but date document {} was not updated: {}",
                cancelled.reservation_id,
                doc_id,
                e
            );
        }
    }

    tracing::info!(
        "Reservation {} cancelled by user {}",
        cancelled.reservation_id,
        session.user_id
    );
    Ok(cancelled)
}

fn duration_hours(duration: DurationMode, wanted: DurationMode) -> i32 {
    if duration == wanted {
        10
    } else {
        0
    }
}

/// Reservation ids look like "RES-MFW3K2C1-9F41CA": a base-36 timestamp
/// plus a random suffix, uppercased.
fn generate_reservation_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect();
    format!("RES-{}-{}", to_base36(millis), suffix).to_uppercase()
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    while value > 0 {
        out.insert(0, char::from(DIGITS[(value % 36) as usize]));
        value /= 36;
    }
    out
}

/// 8-character A-Z0-9 code carried on the reservation for front-desk
/// verification
fn generate_verification_code() -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(8)
        .map(|b| char::from(CHARS[(*b as usize) % CHARS.len()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::models::{Amenity, RoomCategory};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn room() -> RoomOffering {
        RoomOffering {
            id: "deluxe-1".to_string(),
            name: "Deluxe Room".to_string(),
            category: RoomCategory::Room,
            day_rate: dec!(2500),
            overnight_rate: dec!(3500),
            whole_resort_rate: Decimal::ZERO,
            capacity: Some(8),
            amenities: vec![
                Amenity {
                    name: "Wifi".to_string(),
                    price: Decimal::ZERO,
                },
                Amenity {
                    name: "Karaoke".to_string(),
                    price: dec!(500),
                },
            ],
            description: None,
            image_url: None,
            package_type: None,
            active: true,
        }
    }

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // ==================== apply_selection tests ====================

    #[test]
    fn test_apply_selection_normalizes_input() {
        let today = ymd(2025, 10, 6);
        let request = QuoteRequest {
            date: Some(ymd(2025, 10, 10)),
            duration: DurationMode::Day,
            guests: 99,
            amenities: vec![
                "Karaoke".to_string(),
                "Wifi".to_string(),
                "Jacuzzi".to_string(),
            ],
        };
        let selection = apply_selection(&room(), &request, today, &DateAvailabilityIndex::new());

        assert_eq!(selection.date, Some(ymd(2025, 10, 10)));
        assert_eq!(selection.duration, DurationMode::Day);
        // Clamped to capacity
        assert_eq!(selection.guests, 8);
        // Wifi is included and Jacuzzi does not exist; only Karaoke sticks
        assert_eq!(selection.selected_amenities.len(), 1);
        assert_eq!(selection.selected_amenities[0].name, "Karaoke");
    }

    #[test]
    fn test_apply_selection_drops_past_date() {
        let today = ymd(2025, 10, 6);
        let request = QuoteRequest {
            date: Some(ymd(2025, 10, 1)),
            duration: DurationMode::Overnight,
            guests: 2,
            amenities: Vec::new(),
        };
        let selection = apply_selection(&room(), &request, today, &DateAvailabilityIndex::new());
        assert_eq!(selection.date, None);
    }

    #[test]
    fn test_apply_selection_whole_resort_duration_rules() {
        let today = ymd(2025, 10, 6);
        let mut whole = room();
        whole.category = RoomCategory::Whole;

        let request = QuoteRequest {
            date: None,
            duration: DurationMode::Day,
            guests: 2,
            amenities: Vec::new(),
        };
        let selection = apply_selection(&whole, &request, today, &DateAvailabilityIndex::new());
        assert_eq!(selection.duration, DurationMode::WholeResort);

        // A standard room cannot claim the whole-resort duration
        let request = QuoteRequest {
            date: None,
            duration: DurationMode::WholeResort,
            guests: 2,
            amenities: Vec::new(),
        };
        let selection = apply_selection(&room(), &request, today, &DateAvailabilityIndex::new());
        assert_eq!(selection.duration, DurationMode::None);
    }

    // ==================== id generation tests ====================

    #[test]
    fn test_reservation_id_shape() {
        let id = generate_reservation_id();
        assert!(id.starts_with("RES-"));
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(id, id.to_uppercase());
    }

    #[test]
    fn test_verification_code_shape() {
        let code = generate_verification_code();
        assert_eq!(code.len(), 8);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(36 * 36 + 1), "101");
    }

    #[test]
    fn test_duration_hours() {
        assert_eq!(duration_hours(DurationMode::Day, DurationMode::Day), 10);
        assert_eq!(duration_hours(DurationMode::Overnight, DurationMode::Day), 0);
        assert_eq!(duration_hours(DurationMode::None, DurationMode::Day), 0);
    }
}
