//! Request DTOs for the booking API endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::models::{DurationMode, HistoryFilter};

/// Query parameters for the catalog listing
#[derive(Debug, Deserialize)]
pub struct RoomsQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// Query parameters for the room calendar. Month and year default to the
/// current month; `selected` highlights a previously chosen date.
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub selected: Option<NaiveDate>,
}

/// Client selection for a price quote
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: DurationMode,
    #[serde(default)]
    pub guests: i32,
    /// Names of optional amenities to include
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Reservation submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReservationRequest {
    pub room_id: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: DurationMode,
    #[serde(default)]
    pub guests: i32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub payment_method: String,
    /// The total the client displayed. Advisory only - the server
    /// recomputes the price from the stored room.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub quoted_total: Option<Decimal>,
}

impl SubmitReservationRequest {
    pub fn selection(&self) -> QuoteRequest {
        QuoteRequest {
            date: self.date,
            duration: self.duration,
            guests: self.guests,
            amenities: self.amenities.clone(),
        }
    }
}

/// Query parameters for the reservation history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub filter: HistoryFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_request_defaults() {
        let request: QuoteRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.date, None);
        assert_eq!(request.duration, DurationMode::None);
        assert_eq!(request.guests, 0);
        assert!(request.amenities.is_empty());
    }

    #[test]
    fn test_submit_request_parses_wire_shape() {
        let request: SubmitReservationRequest = serde_json::from_value(serde_json::json!({
            "roomId": "deluxe-1",
            "date": "2025-10-06",
            "duration": "overnight",
            "guests": 2,
            "amenities": ["Karaoke"],
            "paymentMethod": "On Arrival",
            "quotedTotal": "4000"
        }))
        .unwrap();
        assert_eq!(request.room_id, "deluxe-1");
        assert_eq!(request.duration, DurationMode::Overnight);
        assert_eq!(
            request.date,
            NaiveDate::from_ymd_opt(2025, 10, 6)
        );
        assert_eq!(request.quoted_total, Some(rust_decimal_macros::dec!(4000)));
    }

    #[test]
    fn test_duration_whole_resort_kebab_case() {
        let request: QuoteRequest =
            serde_json::from_value(serde_json::json!({ "duration": "whole-resort" })).unwrap();
        assert_eq!(request.duration, DurationMode::WholeResort);
    }
}
