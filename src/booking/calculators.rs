//! Availability and pricing calculators.
//!
//! Pure functions over already-fetched data - no database access. The
//! room-detail screen drives these synchronously on every interaction:
//! date taps, duration toggles, amenity toggles, and guest changes.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::models::{DateDocument, DurationMode, ReservationStatus, RoomOffering, SelectionState};

/// Mapping from canonical date key to the reservation summaries for that
/// date and room. Rebuilt from the date-document scan on every screen
/// load, never cached.
pub type DateAvailabilityIndex = HashMap<String, Vec<IndexEntry>>;

/// Per-date reservation summary retained by the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub status: ReservationStatus,
}

const MONTH_ABBREV: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Canonical wire-format key for a calendar date, e.g. "Oct 6, 2025".
///
/// Date documents are matched by string equality against this exact
/// tokenization: three-letter month, no leading zero on the day, a comma,
/// a 4-digit year. Both the index reader and the reservation writer go
/// through this one function.
pub fn date_key(date: NaiveDate) -> String {
    format!(
        "{} {}, {}",
        MONTH_ABBREV[date.month0() as usize],
        date.day(),
        date.year()
    )
}

/// Parse a wire-format date key back into a calendar date.
pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    let (month_str, rest) = s.split_once(' ')?;
    let (day_str, year_str) = rest.split_once(", ")?;
    let month = MONTH_ABBREV.iter().position(|m| *m == month_str)? as u32 + 1;
    NaiveDate::from_ymd_opt(year_str.parse().ok()?, month, day_str.parse().ok()?)
}

/// Row id for a date document: room type key plus ISO date,
/// e.g. "whole_resort_2025-10-06".
pub fn date_doc_id(room_type_key: &str, date: NaiveDate) -> String {
    format!("{}_{}", room_type_key, date.format("%Y-%m-%d"))
}

/// Coerce a stored price value to a decimal amount.
///
/// Legacy records carry prices as numbers or as display strings like
/// "₱2,500". Anything unparseable becomes zero instead of poisoning the
/// computed total.
pub fn parse_price(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
            .unwrap_or(Decimal::ZERO),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
        }
        _ => Decimal::ZERO,
    }
}

/// Build the availability index for one room from the full date-document
/// scan.
///
/// For each document, each summary whose room name matches exactly is
/// appended under the document's date key - no dedup, no ordering
/// guarantee. Malformed or empty input contributes nothing, so a failed
/// scan leaves every date reading as available.
pub fn build_availability_index(
    documents: &[DateDocument],
    room_name: &str,
) -> DateAvailabilityIndex {
    let mut index = DateAvailabilityIndex::new();
    for document in documents {
        for summary in &document.reservations {
            if summary.room_name == room_name {
                index
                    .entry(document.date.clone())
                    .or_default()
                    .push(IndexEntry {
                        status: summary.status,
                    });
            }
        }
    }
    index
}

/// True when at least one reservation on the date still blocks it.
/// Cancelled, completed, and checked-in reservations release the date, as
/// does the absence of any entry.
pub fn is_date_unavailable(date: NaiveDate, index: &DateAvailabilityIndex) -> bool {
    index
        .get(&date_key(date))
        .is_some_and(|entries| entries.iter().any(|e| e.status.blocks_date()))
}

/// One cell of the month grid, Sunday-first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCell {
    /// Leading filler before day 1's weekday column
    Blank,
    Day {
        day: u32,
        disabled: bool,
        selected: bool,
    },
}

/// Render one month of the date-picker calendar.
///
/// Cells are disabled when the date is strictly before `today` or blocked
/// by the availability index; selection compares by calendar date. An
/// unrepresentable month/year yields no cells.
pub fn month_grid(
    month: u32,
    year: i32,
    today: NaiveDate,
    index: &DateAvailabilityIndex,
    selected: Option<NaiveDate>,
) -> Vec<DayCell> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    let offset = first.weekday().num_days_from_sunday();
    let mut cells: Vec<DayCell> = (0..offset).map(|_| DayCell::Blank).collect();

    let mut date = first;
    while date.month() == month {
        cells.push(DayCell::Day {
            day: date.day(),
            disabled: date < today || is_date_unavailable(date, index),
            selected: selected == Some(date),
        });
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    cells
}

/// One line of a computed price breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLine {
    pub label: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
}

/// Computed price for the current selection. Derived on every selection
/// change, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub lines: Vec<PriceLine>,
    #[serde(with = "rust_decimal::serde::str")]
    pub base: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub amenities_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// Compute the total for a room and selection.
///
/// Whole-resort rooms always price at the 24-hour package rate; the
/// duration toggles are ignored for them. Other rooms price the active
/// duration, if any. Selected amenity surcharges are added on top in
/// both cases.
pub fn compute_total(room: &RoomOffering, selection: &SelectionState) -> PriceBreakdown {
    let mut lines = Vec::new();

    let base = if room.category.is_whole_resort() {
        lines.push(PriceLine {
            label: "24-HOUR PACKAGE".to_string(),
            amount: room.whole_resort_rate,
        });
        room.whole_resort_rate
    } else {
        match selection.duration {
            DurationMode::Day => {
                lines.push(PriceLine {
                    label: "DAY".to_string(),
                    amount: room.day_rate,
                });
                room.day_rate
            }
            DurationMode::Overnight => {
                lines.push(PriceLine {
                    label: "OVERNIGHT".to_string(),
                    amount: room.overnight_rate,
                });
                room.overnight_rate
            }
            DurationMode::None | DurationMode::WholeResort => Decimal::ZERO,
        }
    };

    let mut amenities_total = Decimal::ZERO;
    for amenity in &selection.selected_amenities {
        amenities_total += amenity.price;
        lines.push(PriceLine {
            label: amenity.name.clone(),
            amount: amenity.price,
        });
    }

    PriceBreakdown {
        base,
        amenities_total,
        total: base + amenities_total,
        lines,
    }
}

/// A required field missing from the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingField {
    Date,
    Duration,
    Guests,
}

impl MissingField {
    pub fn as_str(self) -> &'static str {
        match self {
            MissingField::Date => "date",
            MissingField::Duration => "duration",
            MissingField::Guests => "guests",
        }
    }
}

/// Fields still required before the selection can be reserved.
/// Whole-resort rooms need no duration; everything needs a date and at
/// least one guest.
pub fn missing_fields(room: &RoomOffering, selection: &SelectionState) -> Vec<MissingField> {
    let mut missing = Vec::new();
    if selection.date.is_none() {
        missing.push(MissingField::Date);
    }
    if !room.category.is_whole_resort()
        && !matches!(selection.duration, DurationMode::Day | DurationMode::Overnight)
    {
        missing.push(MissingField::Duration);
    }
    if selection.guests <= 0 {
        missing.push(MissingField::Guests);
    }
    missing
}

/// Gate for the reserve action
pub fn is_selection_reservable(room: &RoomOffering, selection: &SelectionState) -> bool {
    missing_fields(room, selection).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::models::{Amenity, ReservationSummary, RoomCategory};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn standard_room() -> RoomOffering {
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

    fn whole_resort() -> RoomOffering {
        RoomOffering {
            id: "whole-1".to_string(),
            name: "Palm Cove Resort".to_string(),
            category: RoomCategory::Whole,
            day_rate: dec!(2500),
            overnight_rate: dec!(3500),
            whole_resort_rate: dec!(40000),
            capacity: None,
            amenities: Vec::new(),
            description: None,
            image_url: None,
            package_type: None,
            active: true,
        }
    }

    fn summary(room_name: &str, status: ReservationStatus) -> ReservationSummary {
        ReservationSummary {
            reservation_id: "RES-TEST".to_string(),
            room_name: room_name.to_string(),
            guests: 2,
            user_id: String::new(),
            user_full_name: String::new(),
            status,
            booked_at: None,
        }
    }

    fn document(date: &str, summaries: Vec<ReservationSummary>) -> DateDocument {
        DateDocument {
            date: date.to_string(),
            reservations: summaries,
        }
    }

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // ==================== date_key tests ====================

    #[test]
    fn test_date_key_format() {
        assert_eq!(date_key(ymd(2025, 10, 6)), "Oct 6, 2025");
        assert_eq!(date_key(ymd(2026, 1, 1)), "Jan 1, 2026");
        assert_eq!(date_key(ymd(2025, 12, 25)), "Dec 25, 2025");
    }

    #[test]
    fn test_date_key_no_leading_zero() {
        assert_eq!(date_key(ymd(2025, 3, 9)), "Mar 9, 2025");
        assert_eq!(date_key(ymd(2025, 3, 10)), "Mar 10, 2025");
    }

    #[test]
    fn test_date_key_all_month_abbreviations() {
        let expected = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        for (i, abbrev) in expected.iter().enumerate() {
            let key = date_key(ymd(2025, i as u32 + 1, 15));
            assert_eq!(key, format!("{} 15, 2025", abbrev));
        }
    }

    #[test]
    fn test_parse_date_key_round_trip() {
        for date in [ymd(2025, 10, 6), ymd(2026, 1, 1), ymd(2024, 2, 29)] {
            assert_eq!(parse_date_key(&date_key(date)), Some(date));
        }
        assert_eq!(parse_date_key("not a date"), None);
        assert_eq!(parse_date_key("Foo 6, 2025"), None);
        assert_eq!(parse_date_key("Feb 30, 2025"), None);
    }

    #[test]
    fn test_date_doc_id_uses_iso_date() {
        assert_eq!(
            date_doc_id("whole_resort", ymd(2025, 10, 6)),
            "whole_resort_2025-10-06"
        );
        assert_eq!(date_doc_id("deluxe-1", ymd(2025, 1, 3)), "deluxe-1_2025-01-03");
    }

    // ==================== parse_price tests ====================

    #[test]
    fn test_parse_price_numbers() {
        assert_eq!(parse_price(&json!(2500)), dec!(2500));
        assert_eq!(parse_price(&json!(2500.50)), dec!(2500.5));
        assert_eq!(parse_price(&json!(0)), Decimal::ZERO);
    }

    #[test]
    fn test_parse_price_strings_with_currency_noise() {
        assert_eq!(parse_price(&json!("₱2,500")), dec!(2500));
        assert_eq!(parse_price(&json!("3500")), dec!(3500));
        assert_eq!(parse_price(&json!("₱1,234.56")), dec!(1234.56));
    }

    #[test]
    fn test_parse_price_garbage_coerces_to_zero() {
        assert_eq!(parse_price(&json!("free")), Decimal::ZERO);
        assert_eq!(parse_price(&json!(null)), Decimal::ZERO);
        assert_eq!(parse_price(&json!([2500])), Decimal::ZERO);
        assert_eq!(parse_price(&json!("")), Decimal::ZERO);
    }

    // ==================== availability index tests ====================

    #[test]
    fn test_build_index_filters_by_room_name() {
        let documents = vec![document(
            "Oct 6, 2025",
            vec![
                summary("Deluxe Room", ReservationStatus::Pending),
                summary("Garden Cottage", ReservationStatus::Confirmed),
            ],
        )];
        let index = build_availability_index(&documents, "Deluxe Room");
        assert_eq!(index.len(), 1);
        assert_eq!(index["Oct 6, 2025"].len(), 1);
    }

    #[test]
    fn test_build_index_keeps_duplicates() {
        let documents = vec![document(
            "Oct 6, 2025",
            vec![
                summary("Deluxe Room", ReservationStatus::Pending),
                summary("Deluxe Room", ReservationStatus::Cancelled),
            ],
        )];
        let index = build_availability_index(&documents, "Deluxe Room");
        assert_eq!(index["Oct 6, 2025"].len(), 2);
    }

    #[test]
    fn test_build_index_empty_input_yields_empty_index() {
        let index = build_availability_index(&[], "Deluxe Room");
        assert!(index.is_empty());
        assert!(!is_date_unavailable(ymd(2025, 10, 6), &index));
    }

    #[test]
    fn test_build_index_is_idempotent() {
        let documents = vec![
            document(
                "Oct 6, 2025",
                vec![summary("Deluxe Room", ReservationStatus::Pending)],
            ),
            document(
                "Oct 7, 2025",
                vec![summary("Deluxe Room", ReservationStatus::Cancelled)],
            ),
        ];
        let first = build_availability_index(&documents, "Deluxe Room");
        let second = build_availability_index(&documents, "Deluxe Room");
        assert_eq!(first, second);
    }

    #[test]
    fn test_blocking_statuses() {
        for status in [ReservationStatus::Pending, ReservationStatus::Confirmed] {
            let documents = vec![document("Oct 6, 2025", vec![summary("Deluxe Room", status)])];
            let index = build_availability_index(&documents, "Deluxe Room");
            assert!(
                is_date_unavailable(ymd(2025, 10, 6), &index),
                "{:?} should block",
                status
            );
        }
    }

    #[test]
    fn test_non_blocking_statuses() {
        for status in [
            ReservationStatus::Cancelled,
            ReservationStatus::Completed,
            ReservationStatus::CheckedIn,
            ReservationStatus::Unknown,
        ] {
            let documents = vec![document("Oct 6, 2025", vec![summary("Deluxe Room", status)])];
            let index = build_availability_index(&documents, "Deluxe Room");
            assert!(
                !is_date_unavailable(ymd(2025, 10, 6), &index),
                "{:?} should not block",
                status
            );
        }
    }

    #[test]
    fn test_one_blocking_entry_among_released_blocks() {
        let documents = vec![document(
            "Oct 6, 2025",
            vec![
                summary("Deluxe Room", ReservationStatus::Cancelled),
                summary("Deluxe Room", ReservationStatus::Pending),
            ],
        )];
        let index = build_availability_index(&documents, "Deluxe Room");
        assert!(is_date_unavailable(ymd(2025, 10, 6), &index));
    }

    // ==================== month grid tests ====================

    #[test]
    fn test_month_grid_leading_blanks_and_length() {
        // October 2025 starts on a Wednesday (offset 3) and has 31 days
        let today = ymd(2025, 10, 1);
        let cells = month_grid(10, 2025, today, &DateAvailabilityIndex::new(), None);
        assert_eq!(cells.len(), 3 + 31);
        assert_eq!(&cells[..3], &[DayCell::Blank, DayCell::Blank, DayCell::Blank]);
        assert_eq!(
            cells[3],
            DayCell::Day {
                day: 1,
                disabled: false,
                selected: false
            }
        );
    }

    #[test]
    fn test_month_grid_no_offset_month() {
        // February 2026 starts on a Sunday and has 28 days
        let today = ymd(2026, 2, 1);
        let cells = month_grid(2, 2026, today, &DateAvailabilityIndex::new(), None);
        assert_eq!(cells.len(), 28);
        assert!(matches!(cells[0], DayCell::Day { day: 1, .. }));
    }

    #[test]
    fn test_month_grid_past_dates_disabled_regardless_of_index() {
        let today = ymd(2025, 10, 15);
        let cells = month_grid(10, 2025, today, &DateAvailabilityIndex::new(), None);
        for cell in &cells {
            if let DayCell::Day { day, disabled, .. } = cell {
                assert_eq!(*disabled, *day < 15, "day {}", day);
            }
        }
    }

    #[test]
    fn test_month_grid_booked_date_disabled() {
        let today = ymd(2025, 10, 1);
        let documents = vec![document(
            "Oct 6, 2025",
            vec![summary("Deluxe Room", ReservationStatus::Confirmed)],
        )];
        let index = build_availability_index(&documents, "Deluxe Room");
        let cells = month_grid(10, 2025, today, &index, None);
        let day6 = cells
            .iter()
            .find(|c| matches!(c, DayCell::Day { day: 6, .. }))
            .unwrap();
        assert!(matches!(day6, DayCell::Day { disabled: true, .. }));
    }

    #[test]
    fn test_month_grid_selection_by_calendar_date() {
        let today = ymd(2025, 10, 1);
        let selected = Some(ymd(2025, 10, 20));
        let cells = month_grid(10, 2025, today, &DateAvailabilityIndex::new(), selected);
        let selected_days: Vec<u32> = cells
            .iter()
            .filter_map(|c| match c {
                DayCell::Day {
                    day, selected: true, ..
                } => Some(*day),
                _ => None,
            })
            .collect();
        assert_eq!(selected_days, vec![20]);

        // A selection in another month never matches by day number alone
        let cells = month_grid(11, 2025, today, &DateAvailabilityIndex::new(), selected);
        assert!(!cells
            .iter()
            .any(|c| matches!(c, DayCell::Day { selected: true, .. })));
    }

    #[test]
    fn test_month_grid_invalid_month() {
        let today = ymd(2025, 10, 1);
        assert!(month_grid(13, 2025, today, &DateAvailabilityIndex::new(), None).is_empty());
    }

    // ==================== compute_total tests ====================

    fn selection_with(duration: DurationMode, amenities: Vec<Amenity>) -> SelectionState {
        SelectionState {
            date: Some(ymd(2025, 10, 6)),
            duration,
            guests: 2,
            selected_amenities: amenities,
        }
    }

    #[test]
    fn test_compute_total_day_rate() {
        let breakdown = compute_total(&standard_room(), &selection_with(DurationMode::Day, vec![]));
        assert_eq!(breakdown.base, dec!(2500));
        assert_eq!(breakdown.total, dec!(2500));
        assert_eq!(breakdown.lines.len(), 1);
        assert_eq!(breakdown.lines[0].label, "DAY");
    }

    #[test]
    fn test_compute_total_overnight_rate() {
        let breakdown =
            compute_total(&standard_room(), &selection_with(DurationMode::Overnight, vec![]));
        assert_eq!(breakdown.total, dec!(3500));
        assert_eq!(breakdown.lines[0].label, "OVERNIGHT");
    }

    #[test]
    fn test_compute_total_no_duration_is_zero_base() {
        let breakdown = compute_total(&standard_room(), &selection_with(DurationMode::None, vec![]));
        assert_eq!(breakdown.base, Decimal::ZERO);
        assert_eq!(breakdown.total, Decimal::ZERO);
        assert!(breakdown.lines.is_empty());
    }

    #[test]
    fn test_compute_total_whole_resort_ignores_duration() {
        let breakdown = compute_total(&whole_resort(), &selection_with(DurationMode::Day, vec![]));
        assert_eq!(breakdown.total, dec!(40000));
        assert_eq!(breakdown.lines[0].label, "24-HOUR PACKAGE");

        let breakdown =
            compute_total(&whole_resort(), &selection_with(DurationMode::Overnight, vec![]));
        assert_eq!(breakdown.total, dec!(40000));
    }

    #[test]
    fn test_compute_total_with_amenity_surcharge() {
        let karaoke = Amenity {
            name: "Karaoke".to_string(),
            price: dec!(500),
        };
        let breakdown = compute_total(
            &standard_room(),
            &selection_with(DurationMode::Day, vec![karaoke.clone()]),
        );
        assert_eq!(breakdown.total, dec!(3000));
        assert_eq!(breakdown.amenities_total, dec!(500));

        let breakdown = compute_total(
            &standard_room(),
            &selection_with(DurationMode::Overnight, vec![karaoke]),
        );
        assert_eq!(breakdown.total, dec!(4000));
        assert_eq!(breakdown.lines.len(), 2);
        assert_eq!(breakdown.lines[1].label, "Karaoke");
    }

    // ==================== reservable gate tests ====================

    #[test]
    fn test_reservable_requires_all_three() {
        let room = standard_room();
        let complete = selection_with(DurationMode::Day, vec![]);
        assert!(is_selection_reservable(&room, &complete));

        let no_guests = SelectionState {
            guests: 0,
            ..complete.clone()
        };
        assert!(!is_selection_reservable(&room, &no_guests));
        assert_eq!(missing_fields(&room, &no_guests), vec![MissingField::Guests]);

        let no_date = SelectionState {
            date: None,
            ..complete.clone()
        };
        assert_eq!(missing_fields(&room, &no_date), vec![MissingField::Date]);

        let no_duration = SelectionState {
            duration: DurationMode::None,
            ..complete
        };
        assert_eq!(
            missing_fields(&room, &no_duration),
            vec![MissingField::Duration]
        );
    }

    #[test]
    fn test_whole_resort_needs_no_duration() {
        let selection = SelectionState {
            date: Some(ymd(2025, 10, 6)),
            duration: DurationMode::None,
            guests: 10,
            selected_amenities: Vec::new(),
        };
        assert!(is_selection_reservable(&whole_resort(), &selection));
    }

    #[test]
    fn test_empty_selection_reports_every_missing_field() {
        let missing = missing_fields(&standard_room(), &SelectionState::new());
        assert_eq!(
            missing,
            vec![MissingField::Date, MissingField::Duration, MissingField::Guests]
        );
    }
}
