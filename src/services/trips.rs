use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::{
    db::DbPool,
    error::AppError,
    models::trip::{Trip, TripCompletion, TripStatus, TripWithDays},
};

pub const RECENT_LIMIT: i64 = 5;

// Undated trips sort last; ties go to the newest.
const BY_START_DATE: &str = "ORDER BY start_date IS NULL, start_date DESC, created_at DESC";

pub async fn list_trips(db: &DbPool, user_id: &str) -> Result<Vec<Trip>, AppError> {
    let sql = format!("SELECT * FROM trips WHERE user_id = ?1 {BY_START_DATE}");
    let trips = sqlx::query_as(&sql).bind(user_id).fetch_all(db).await?;
    Ok(trips)
}

pub async fn recent_trips(db: &DbPool, user_id: &str) -> Result<Vec<Trip>, AppError> {
    let sql = format!("SELECT * FROM trips WHERE user_id = ?1 {BY_START_DATE} LIMIT ?2");
    let trips = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(RECENT_LIMIT)
        .fetch_all(db)
        .await?;
    Ok(trips)
}

pub async fn completed_trips(db: &DbPool, user_id: &str) -> Result<Vec<Trip>, AppError> {
    let trips = sqlx::query_as(
        r#"SELECT * FROM trips
           WHERE user_id = ?1 AND status = ?2
           ORDER BY completed_at DESC, created_at DESC"#,
    )
    .bind(user_id)
    .bind(TripStatus::Completed)
    .fetch_all(db)
    .await?;
    Ok(trips)
}

/// A trip is only visible to its owner; anything else is "not found".
pub async fn find_trip(
    db: &DbPool,
    user_id: &str,
    trip_id: &str,
) -> Result<Option<TripWithDays>, AppError> {
    let trip: Option<Trip> = sqlx::query_as("SELECT * FROM trips WHERE id = ?1 AND user_id = ?2")
        .bind(trip_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    let Some(trip) = trip else {
        return Ok(None);
    };

    let itinerary = sqlx::query_as(
        "SELECT * FROM itinerary_days WHERE trip_id = ?1 ORDER BY day_number ASC",
    )
    .bind(&trip.id)
    .fetch_all(db)
    .await?;

    Ok(Some(TripWithDays { trip, itinerary }))
}

pub async fn complete_trip(
    db: &DbPool,
    user_id: &str,
    trip_id: &str,
    completion: TripCompletion,
) -> Result<TripWithDays, AppError> {
    completion.validate()?;

    let existing = find_trip(db, user_id, trip_id)
        .await?
        .ok_or(AppError::NotFound("Trip not found"))?;
    match existing.trip.status {
        TripStatus::Completed => {
            return Err(AppError::Conflict("trip is already completed".into()))
        }
        TripStatus::Cancelled => {
            return Err(AppError::Conflict("cancelled trips cannot be completed".into()))
        }
        _ => {}
    }

    let review = completion
        .review
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    let now = Utc::now();
    let updated = sqlx::query(
        r#"UPDATE trips
           SET status = ?1, rating = ?2, review = ?3, completed_at = ?4, updated_at = ?4
           WHERE id = ?5 AND user_id = ?6 AND status NOT IN (?1, ?7)"#,
    )
    .bind(TripStatus::Completed)
    .bind(i64::from(completion.rating))
    .bind(&review)
    .bind(now)
    .bind(trip_id)
    .bind(user_id)
    .bind(TripStatus::Cancelled)
    .execute(db)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(AppError::Conflict("trip is already completed".into()));
    }

    info!(trip_id, rating = completion.rating, "trip marked complete");
    find_trip(db, user_id, trip_id)
        .await?
        .ok_or(AppError::NotFound("Trip not found"))
}
