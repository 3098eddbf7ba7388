//! Response DTOs for the booking API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::cache::CacheStats;

use super::calculators::{DayCell, PriceBreakdown};
use super::models::{Amenity, Reservation, ReservationStatus, RoomCategory, RoomOffering};

/// One amenity as shown on the room-detail screen
#[derive(Debug, Serialize)]
pub struct AmenityResponse {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub optional: bool,
}

/// A room offering for the catalog and detail screens
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: String,
    pub name: String,
    pub category: RoomCategory,
    #[serde(with = "rust_decimal::serde::str")]
    pub day_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub overnight_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub whole_resort_rate: Decimal,
    pub capacity: i32,
    pub amenities: Vec<AmenityResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    pub active: bool,
}

impl From<&RoomOffering> for RoomResponse {
    fn from(room: &RoomOffering) -> Self {
        Self {
            id: room.id.clone(),
            name: room.name.clone(),
            category: room.category,
            day_rate: room.day_rate,
            overnight_rate: room.overnight_rate,
            whole_resort_rate: room.whole_resort_rate,
            capacity: room.effective_capacity(),
            amenities: room
                .amenities
                .iter()
                .map(|a: &Amenity| AmenityResponse {
                    name: a.name.clone(),
                    price: a.price,
                    optional: a.is_optional(),
                })
                .collect(),
            description: room.description.clone(),
            image_url: room.image_url.clone(),
            package_type: room.package_type.clone(),
            active: room.active,
        }
    }
}

/// One cell of the calendar grid. Blank filler cells have no day number.
#[derive(Debug, Serialize)]
pub struct DayCellResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    pub disabled: bool,
    pub selected: bool,
}

impl From<DayCell> for DayCellResponse {
    fn from(cell: DayCell) -> Self {
        match cell {
            DayCell::Blank => Self {
                day: None,
                disabled: true,
                selected: false,
            },
            DayCell::Day {
                day,
                disabled,
                selected,
            } => Self {
                day: Some(day),
                disabled,
                selected,
            },
        }
    }
}

/// A month of the date-picker calendar
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    pub month: u32,
    pub year: i32,
    /// Header label, e.g. "October 2025"
    pub month_label: String,
    pub week_days: [&'static str; 7],
    pub cells: Vec<DayCellResponse>,
}

/// Price quote for a selection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub breakdown: PriceBreakdown,
    pub reservable: bool,
    /// Fields still required before the reserve action enables
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// Receipt returned after a reservation is submitted
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationReceipt {
    pub reservation_id: String,
    pub status: ReservationStatus,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub payment_method: String,
    pub date: String,
    pub verification_code: String,
    /// False when the reservation was saved but the date document was not
    /// updated
    pub date_index_updated: bool,
}

/// A reservation as shown in history and detail screens
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: Uuid,
    pub reservation_id: String,
    pub room_name: String,
    pub date: String,
    pub guests: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub payment_method: String,
    pub status: ReservationStatus,
    pub time_period: &'static str,
    pub qr_code_sent: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Reservation> for ReservationResponse {
    fn from(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id,
            reservation_id: reservation.reservation_id.clone(),
            room_name: reservation.room_name.clone(),
            date: reservation.date.clone(),
            guests: reservation.guests,
            total_amount: reservation.total_amount,
            payment_method: reservation.payment_method.clone(),
            status: ReservationStatus::parse(&reservation.status),
            time_period: reservation.time_period(),
            qr_code_sent: reservation.qr_code_sent,
            created_at: reservation.created_at,
            updated_at: reservation.updated_at,
        }
    }
}

/// Reservation history listing
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub reservations: Vec<ReservationResponse>,
}

/// Liveness and cache stats
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: CacheStats,
}
