//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Sign in required")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Incomplete reservation: missing {}", .0.join(", "))]
    IncompleteReservation(Vec<String>),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to the mobile client
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, missing) = match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Not found".to_string(),
                None,
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Please sign in to continue".to_string(),
                None,
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Something went wrong. Please try again.".to_string(),
                    None,
                )
            }
            AppError::IncompleteReservation(fields) => {
                let message = incomplete_reservation_message(&fields);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "incomplete_reservation",
                    message,
                    Some(fields),
                )
            }
            AppError::Unprocessable(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", message, None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Something went wrong. Please try again.".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error,
            message,
            missing,
        };

        (status, Json(body)).into_response()
    }
}

/// User-facing message naming each field still needed before the
/// reservation can be submitted.
fn incomplete_reservation_message(fields: &[String]) -> String {
    let mut parts = Vec::new();
    for field in fields {
        match field.as_str() {
            "date" => parts.push("a check-in date"),
            "duration" => parts.push("a stay duration"),
            "guests" => parts.push("at least 1 guest"),
            _ => {}
        }
    }
    if parts.is_empty() {
        "Please complete your reservation details to proceed.".to_string()
    } else {
        format!("Please select {} to proceed.", parts.join(" and "))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
