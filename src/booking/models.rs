//! Domain models for accommodations, reservations, and date documents.
//!
//! Catalog and date rows keep their document payloads in JSONB columns,
//! preserving the shapes the legacy document store used. The `parse`
//! methods turn raw rows into domain types, coercing legacy price noise
//! instead of failing.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::calculators::{is_date_unavailable, parse_price, DateAvailabilityIndex};

/// Accommodation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomCategory {
    Room,
    Cottage,
    /// Exclusive use of the entire property at a fixed 24-hour rate
    Whole,
}

impl RoomCategory {
    pub fn is_whole_resort(self) -> bool {
        matches!(self, RoomCategory::Whole)
    }

    /// Legacy records store the category as a plain string; anything
    /// unrecognized reads as a standard room.
    pub fn parse(s: &str) -> Self {
        match s {
            "cottage" => RoomCategory::Cottage,
            "whole" => RoomCategory::Whole,
            _ => RoomCategory::Room,
        }
    }
}

/// An amenity on a room offering. Zero-price amenities are included with
/// the room and cannot be toggled; priced ones are optional surcharges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Amenity {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

impl Amenity {
    pub fn is_optional(&self) -> bool {
        self.price > Decimal::ZERO
    }
}

/// Immutable room snapshot consumed by the calculator and the screens
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomOffering {
    pub id: String,
    pub name: String,
    pub category: RoomCategory,
    #[serde(with = "rust_decimal::serde::str")]
    pub day_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub overnight_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub whole_resort_rate: Decimal,
    pub capacity: Option<i32>,
    pub amenities: Vec<Amenity>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub package_type: Option<String>,
    pub active: bool,
}

impl RoomOffering {
    const WHOLE_RESORT_CAPACITY: i32 = 50;
    const ROOM_CAPACITY: i32 = 8;

    /// Stored capacity, or the per-category default when the record has
    /// none.
    pub fn effective_capacity(&self) -> i32 {
        self.capacity.unwrap_or(if self.category.is_whole_resort() {
            Self::WHOLE_RESORT_CAPACITY
        } else {
            Self::ROOM_CAPACITY
        })
    }

    /// Key used in date-document row ids. Whole-resort bookings share one
    /// key; everything else books under the room id, falling back to a
    /// slug of the name for records without one.
    pub fn room_type_key(&self) -> String {
        if self.category.is_whole_resort() {
            "whole_resort".to_string()
        } else if !self.id.is_empty() {
            self.id.clone()
        } else {
            format!("room_{}", slugify(&self.name))
        }
    }
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Accommodation row as stored. Price columns are JSON because legacy
/// records carry them as numbers or display strings.
#[derive(Debug, Clone, FromRow)]
pub struct AccommodationRow {
    pub id: String,
    pub name: String,
    pub room_type: String,
    pub day_price: serde_json::Value,
    pub overnight_price: serde_json::Value,
    pub whole_resort_price: serde_json::Value,
    pub capacity: Option<i32>,
    pub amenities: Option<serde_json::Value>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub package_type: Option<String>,
    pub status: Option<String>,
}

impl AccommodationRow {
    /// Parse the stored row into an offering. Malformed prices coerce to
    /// zero; a missing status reads as active.
    pub fn parse(self) -> RoomOffering {
        RoomOffering {
            category: RoomCategory::parse(&self.room_type),
            day_rate: parse_price(&self.day_price),
            overnight_rate: parse_price(&self.overnight_price),
            whole_resort_rate: parse_price(&self.whole_resort_price),
            amenities: parse_amenities(self.amenities.as_ref()),
            active: self.status.as_deref().map_or(true, |s| s == "Active"),
            id: self.id,
            name: self.name,
            capacity: self.capacity,
            description: self.description,
            image_url: self.image_url,
            package_type: self.package_type,
        }
    }
}

/// Amenity lists arrive either as `["Wifi", ...]` (included, price 0) or
/// as `[{"name": ..., "price": ...}, ...]`. Anything else contributes
/// nothing.
pub fn parse_amenities(value: Option<&serde_json::Value>) -> Vec<Amenity> {
    let Some(serde_json::Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::String(name) => Some(Amenity {
                name: name.clone(),
                price: Decimal::ZERO,
            }),
            serde_json::Value::Object(obj) => {
                let name = obj.get("name")?.as_str()?.to_string();
                let price = obj.get("price").map(parse_price).unwrap_or(Decimal::ZERO);
                Some(Amenity { name, price })
            }
            _ => None,
        })
        .collect()
}

/// Reservation lifecycle status. Only `pending` and `confirmed` block a
/// date; every other status releases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    #[serde(rename = "checked-in")]
    CheckedIn,
    Completed,
    Cancelled,
    Unknown,
}

impl ReservationStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => ReservationStatus::Pending,
            "confirmed" => ReservationStatus::Confirmed,
            "checked-in" => ReservationStatus::CheckedIn,
            "completed" => ReservationStatus::Completed,
            "cancelled" => ReservationStatus::Cancelled,
            _ => ReservationStatus::Unknown,
        }
    }

    pub fn blocks_date(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked-in",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Unknown => "unknown",
        }
    }
}

impl<'de> Deserialize<'de> for ReservationStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ReservationStatus::parse(&s))
    }
}

/// Reservation summary embedded in a date document. Field names follow
/// the legacy document store's camelCase keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSummary {
    pub reservation_id: String,
    pub room_name: String,
    #[serde(default)]
    pub guests: i32,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_full_name: String,
    /// Summaries written before statuses existed carry none; they read as
    /// pending.
    #[serde(default = "default_summary_status")]
    pub status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<DateTime<Utc>>,
}

fn default_summary_status() -> ReservationStatus {
    ReservationStatus::Pending
}

/// A date-keyed document of reservation summaries, the shape the
/// availability index builder consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateDocument {
    pub date: String,
    #[serde(default)]
    pub reservations: Vec<ReservationSummary>,
}

/// Date-document row; the summaries live in a JSONB array.
#[derive(Debug, Clone, FromRow)]
pub struct DateRow {
    pub doc_id: String,
    pub date: String,
    pub normalized_date: Option<String>,
    pub room_type_key: Option<String>,
    pub reservations: serde_json::Value,
}

impl DateRow {
    /// Parse into a document, keyed on the normalized date when present.
    /// Malformed summaries are dropped rather than failing the scan.
    pub fn parse(self) -> DateDocument {
        let reservations = match self.reservations {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        };
        DateDocument {
            date: self.normalized_date.unwrap_or(self.date),
            reservations,
        }
    }
}

/// Reservation record
#[derive(Debug, Clone, FromRow)]
pub struct Reservation {
    pub id: Uuid,
    pub reservation_id: String,
    pub user_id: String,
    pub user_full_name: String,
    pub user_email: String,
    pub room_id: String,
    pub room_name: String,
    pub room_type_key: String,
    pub date: String,
    pub guests: i32,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub status: String,
    pub day_hours: i32,
    pub overnight_hours: i32,
    pub is_whole_resort: bool,
    pub qr_code_sent: bool,
    pub verification_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Label shown in the history list
    pub fn time_period(&self) -> &'static str {
        if self.is_whole_resort {
            "24 HOURS"
        } else if self.day_hours > 0 && self.overnight_hours > 0 {
            "DAY + OVERNIGHT"
        } else if self.day_hours > 0 {
            "DAY PACKAGE"
        } else if self.overnight_hours > 0 {
            "OVERNIGHT PACKAGE"
        } else {
            "CUSTOM"
        }
    }
}

/// Fields for a new reservation record
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub reservation_id: String,
    pub user_id: String,
    pub user_full_name: String,
    pub user_email: String,
    pub room_id: String,
    pub room_name: String,
    pub room_type_key: String,
    pub date: String,
    pub guests: i32,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub day_hours: i32,
    pub overnight_hours: i32,
    pub is_whole_resort: bool,
    pub verification_code: String,
}

/// Reservation-history filter tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    #[default]
    All,
    Upcoming,
    Past,
    Cancelled,
}

impl HistoryFilter {
    pub fn matches(self, status: ReservationStatus) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Upcoming => {
                matches!(status, ReservationStatus::Pending | ReservationStatus::Confirmed)
            }
            HistoryFilter::Past => {
                matches!(status, ReservationStatus::Completed | ReservationStatus::CheckedIn)
            }
            HistoryFilter::Cancelled => status == ReservationStatus::Cancelled,
        }
    }
}

/// Stay duration. Day and overnight are mutually exclusive by
/// construction: selecting one replaces the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationMode {
    #[default]
    None,
    Day,
    Overnight,
    WholeResort,
}

/// Transient per-screen selection state, fresh on every screen visit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub date: Option<NaiveDate>,
    pub duration: DurationMode,
    pub guests: i32,
    pub selected_amenities: Vec<Amenity>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selecting a past or unavailable date is a no-op; an enabled date
    /// replaces the current selection.
    pub fn select_date(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
        index: &DateAvailabilityIndex,
    ) {
        if date < today || is_date_unavailable(date, index) {
            return;
        }
        self.date = Some(date);
    }

    pub fn select_day(&mut self) {
        self.duration = DurationMode::Day;
    }

    pub fn select_overnight(&mut self) {
        self.duration = DurationMode::Overnight;
    }

    pub fn clear_duration(&mut self) {
        self.duration = DurationMode::None;
    }

    /// Included amenities cannot be toggled; optional ones toggle in and
    /// out of the selection.
    pub fn toggle_amenity(&mut self, amenity: &Amenity) {
        if !amenity.is_optional() {
            return;
        }
        if let Some(pos) = self
            .selected_amenities
            .iter()
            .position(|a| a.name == amenity.name)
        {
            self.selected_amenities.remove(pos);
        } else {
            self.selected_amenities.push(amenity.clone());
        }
    }

    pub fn increment_guests(&mut self, capacity: i32) {
        self.guests = (self.guests + 1).min(capacity);
    }

    pub fn decrement_guests(&mut self) {
        self.guests = (self.guests - 1).max(0);
    }

    pub fn set_guests(&mut self, guests: i32, capacity: i32) {
        self.guests = guests.clamp(0, capacity.max(0));
    }
}
