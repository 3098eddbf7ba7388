//! Database queries for the booking engine.
//!
//! Plain sqlx queries over the accommodations catalog, the date-document
//! table, and the reservations table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::{AccommodationRow, DateRow, NewReservation, Reservation};

/// List catalog rows, optionally restricted to one category
pub async fn list_accommodations(
    pool: &PgPool,
    category: Option<&str>,
) -> Result<Vec<AccommodationRow>, AppError> {
    let rows = match category {
        Some(cat) => {
            sqlx::query_as::<_, AccommodationRow>(
                r#"
                SELECT
                    id, name, room_type,
                    day_price, overnight_price, whole_resort_price,
                    capacity, amenities, description, image_url,
                    package_type, status
                FROM accommodations
                WHERE room_type = $1
                ORDER BY name
                "#,
            )
            .bind(cat)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, AccommodationRow>(
                r#"
                SELECT
                    id, name, room_type,
                    day_price, overnight_price, whole_resort_price,
                    capacity, amenities, description, image_url,
                    package_type, status
                FROM accommodations
                ORDER BY name
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

/// Get one catalog row by id
pub async fn get_accommodation(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AccommodationRow>, AppError> {
    let row = sqlx::query_as::<_, AccommodationRow>(
        r#"
        SELECT
            id, name, room_type,
            day_price, overnight_price, whole_resort_price,
            capacity, amenities, description, image_url,
            package_type, status
        FROM accommodations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Full scan of the date-document table. The availability index is built
/// from this on every room-detail load.
pub async fn list_date_documents(pool: &PgPool) -> Result<Vec<DateRow>, AppError> {
    let rows = sqlx::query_as::<_, DateRow>(
        r#"
        SELECT doc_id, date, normalized_date, room_type_key, reservations
        FROM booking_dates
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Append a reservation summary to a date document, creating the document
/// if the date has none yet.
pub async fn upsert_date_reservation(
    pool: &PgPool,
    doc_id: &str,
    date: &str,
    normalized_date: &str,
    room_type_key: &str,
    summary: &serde_json::Value,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO booking_dates
            (doc_id, date, normalized_date, room_type_key, reservations, created_at, last_updated)
        VALUES ($1, $2, $3, $4, jsonb_build_array($5::jsonb), NOW(), NOW())
        ON CONFLICT (doc_id) DO UPDATE
        SET reservations = booking_dates.reservations || excluded.reservations,
            last_updated = NOW()
        "#,
    )
    .bind(doc_id)
    .bind(date)
    .bind(normalized_date)
    .bind(room_type_key)
    .bind(summary)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark one summary in a date document as cancelled so the date frees up
pub async fn mark_date_reservation_cancelled(
    pool: &PgPool,
    doc_id: &str,
    reservation_id: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE booking_dates
        SET reservations = (
                SELECT COALESCE(
                    jsonb_agg(
                        CASE
                            WHEN elem->>'reservationId' = $2
                            THEN jsonb_set(elem, '{status}', '"cancelled"')
                            ELSE elem
                        END
                    ),
                    '[]'::jsonb
                )
                FROM jsonb_array_elements(reservations) AS elem
            ),
            last_updated = NOW()
        WHERE doc_id = $1
        "#,
    )
    .bind(doc_id)
    .bind(reservation_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a new reservation record and return it
pub async fn insert_reservation(
    pool: &PgPool,
    new: &NewReservation,
) -> Result<Reservation, AppError> {
    let reservation = sqlx::query_as::<_, Reservation>(
        r#"
        INSERT INTO reservations (
            id, reservation_id,
            user_id, user_full_name, user_email,
            room_id, room_name, room_type_key,
            date, guests, total_amount, payment_method, status,
            day_hours, overnight_hours, is_whole_resort,
            qr_code_sent, verification_code,
            created_at
        )
        VALUES (
            gen_random_uuid(), $1,
            $2, $3, $4,
            $5, $6, $7,
            $8, $9, $10, $11, 'pending',
            $12, $13, $14,
            FALSE, $15,
            NOW()
        )
        RETURNING
            id, reservation_id,
            user_id, user_full_name, user_email,
            room_id, room_name, room_type_key,
            date, guests, total_amount, payment_method, status,
            day_hours, overnight_hours, is_whole_resort,
            qr_code_sent, verification_code,
            created_at, updated_at
        "#,
    )
    .bind(&new.reservation_id)
    .bind(&new.user_id)
    .bind(&new.user_full_name)
    .bind(&new.user_email)
    .bind(&new.room_id)
    .bind(&new.room_name)
    .bind(&new.room_type_key)
    .bind(&new.date)
    .bind(new.guests)
    .bind(new.total_amount)
    .bind(&new.payment_method)
    .bind(new.day_hours)
    .bind(new.overnight_hours)
    .bind(new.is_whole_resort)
    .bind(&new.verification_code)
    .fetch_one(pool)
    .await?;

    Ok(reservation)
}

/// All reservations for one user, newest first
pub async fn list_reservations_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<Reservation>, AppError> {
    let reservations = sqlx::query_as::<_, Reservation>(
        r#"
        SELECT
            id, reservation_id,
            user_id, user_full_name, user_email,
            room_id, room_name, room_type_key,
            date, guests, total_amount, payment_method, status,
            day_hours, overnight_hours, is_whole_resort,
            qr_code_sent, verification_code,
            created_at, updated_at
        FROM reservations
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(reservations)
}

/// Get one reservation by row id
pub async fn get_reservation(pool: &PgPool, id: Uuid) -> Result<Option<Reservation>, AppError> {
    let reservation = sqlx::query_as::<_, Reservation>(
        r#"
        SELECT
            id, reservation_id,
            user_id, user_full_name, user_email,
            room_id, room_name, room_type_key,
            date, guests, total_amount, payment_method, status,
            day_hours, overnight_hours, is_whole_resort,
            qr_code_sent, verification_code,
            created_at, updated_at
        FROM reservations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(reservation)
}

/// Cancel a pending reservation owned by the user. Returns the updated
/// record, or None when the row no longer matches (already confirmed,
/// already cancelled, or not the caller's).
pub async fn cancel_reservation(
    pool: &PgPool,
    id: Uuid,
    user_id: &str,
) -> Result<Option<Reservation>, AppError> {
    let reservation = sqlx::query_as::<_, Reservation>(
        r#"
        UPDATE reservations
        SET status = 'cancelled',
            updated_at = NOW()
        WHERE id = $1
          AND user_id = $2
          AND status = 'pending'
        RETURNING
            id, reservation_id,
            user_id, user_full_name, user_email,
            room_id, room_name, room_type_key,
            date, guests, total_amount, payment_method, status,
            day_hours, overnight_hours, is_whole_resort,
            qr_code_sent, verification_code,
            created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(reservation)
}
