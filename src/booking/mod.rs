//! Booking engine for the resort mobile app.
//!
//! Availability and pricing derivation for the room-detail screen, plus
//! the reservation flow the review and history screens drive. The
//! calculators are pure; the services own the database access.

pub mod calculators;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{
    build_availability_index, compute_total, date_key, is_date_unavailable,
    is_selection_reservable, month_grid, DateAvailabilityIndex, DayCell, PriceBreakdown,
};
pub use models::{RoomOffering, SelectionState};
pub use routes::router;
