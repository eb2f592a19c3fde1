//! The trip search pipeline: validate the query, prompt the model, check its
//! answer, then store the search, trip and itinerary in one transaction.

use std::time::Instant;

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        recommendation::{parse_recommendation, TripRecommendation},
        search::{SavedSearch, SearchQuery, SearchRequest},
        trip::{ItineraryDay, TravelMode, Trip, TripStatus, TripWithDays},
    },
    services::recommender::build_prompt,
    state::AppState,
    views::TripDetailView,
};

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub trip: TripDetailView,
    pub recommendation: TripRecommendation,
}

pub async fn search_trip(
    state: &AppState,
    user_id: &str,
    request: SearchRequest,
) -> Result<SearchOutcome, AppError> {
    let query = SearchQuery::from_request(request)?;
    ensure_user_exists(&state.db, user_id).await?;

    info!(
        user_id,
        from = %query.current_location,
        to = %query.destination,
        "planning trip"
    );
    let prompt = build_prompt(&query);
    let started = Instant::now();
    let raw = state.recommender.generate(&prompt).await?;
    let recommendation = parse_recommendation(&raw).inspect_err(|err| {
        warn!(user_id, "discarding model output: {err}");
    })?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        days = recommendation.itinerary.len(),
        "recommendation accepted"
    );

    let stored = persist_trip(&state.db, user_id, &query, &recommendation).await?;
    info!(trip_id = %stored.trip.id, "trip saved from search");

    Ok(SearchOutcome {
        trip: TripDetailView::from(&stored),
        recommendation,
    })
}

async fn ensure_user_exists(db: &DbPool, user_id: &str) -> Result<(), AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    if count == 0 {
        return Err(AppError::NotFound("User not found"));
    }
    Ok(())
}

/// Writes the saved search, the trip, its days and the search's back-link.
/// Nothing is kept unless every statement succeeds.
pub async fn persist_trip(
    db: &DbPool,
    user_id: &str,
    query: &SearchQuery,
    recommendation: &TripRecommendation,
) -> Result<TripWithDays, AppError> {
    let now = Utc::now();
    let mut tx = db.begin().await?;

    let search_id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"INSERT INTO saved_searches
           (id, user_id, current_location, destination, budget, start_date, end_date,
            mode_of_travel, number_of_days, trip_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, ?10)"#,
    )
    .bind(&search_id)
    .bind(user_id)
    .bind(&query.current_location)
    .bind(&query.destination)
    .bind(query.budget)
    .bind(query.start_date)
    .bind(query.end_date)
    .bind(query.mode)
    .bind(query.number_of_days())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let description = Some(recommendation.tips.join("\n")).filter(|text| !text.is_empty());
    let trip = Trip {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        from_location: query.current_location.clone(),
        to_location: query.destination.clone(),
        start_date: query.start_date,
        end_date: query.end_date,
        budget: Some(recommendation.budget_breakdown.total()),
        mode_of_travel: query
            .mode
            .or_else(|| TravelMode::normalize(recommendation.mode_of_travel.as_deref())),
        duration: Some(i64::from(recommendation.duration)),
        activities: Json(recommendation.activities.clone()),
        description,
        status: TripStatus::Planning,
        rating: None,
        review: None,
        completed_at: None,
        created_at: now,
        updated_at: now,
    };
    sqlx::query(
        r#"INSERT INTO trips
           (id, user_id, from_location, to_location, start_date, end_date, budget,
            mode_of_travel, duration, activities, description, status, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)"#,
    )
    .bind(&trip.id)
    .bind(&trip.user_id)
    .bind(&trip.from_location)
    .bind(&trip.to_location)
    .bind(trip.start_date)
    .bind(trip.end_date)
    .bind(trip.budget)
    .bind(trip.mode_of_travel)
    .bind(trip.duration)
    .bind(&trip.activities)
    .bind(&trip.description)
    .bind(trip.status)
    .bind(trip.created_at)
    .execute(&mut *tx)
    .await?;

    let anchor = query.start_date.unwrap_or_else(|| now.date_naive());
    let mut itinerary = Vec::with_capacity(recommendation.itinerary.len());
    for entry in &recommendation.itinerary {
        let day_number = i64::from(entry.day);
        let day = ItineraryDay {
            id: Uuid::new_v4().to_string(),
            trip_id: trip.id.clone(),
            day_number,
            date: anchor + Duration::days(day_number - 1),
            activities: Json(entry.activities.clone()),
            notes: Some(entry.notes.trim().to_string()).filter(|notes| !notes.is_empty()),
        };
        sqlx::query(
            r#"INSERT INTO itinerary_days (id, trip_id, day_number, date, activities, notes)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(&day.id)
        .bind(&day.trip_id)
        .bind(day.day_number)
        .bind(day.date)
        .bind(&day.activities)
        .bind(&day.notes)
        .execute(&mut *tx)
        .await?;
        itinerary.push(day);
    }

    sqlx::query("UPDATE saved_searches SET trip_id = ?1 WHERE id = ?2")
        .bind(&trip.id)
        .bind(&search_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(TripWithDays { trip, itinerary })
}

pub async fn list_saved_searches(db: &DbPool, user_id: &str) -> Result<Vec<SavedSearch>, AppError> {
    let searches = sqlx::query_as(
        "SELECT * FROM saved_searches WHERE user_id = ?1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(searches)
}
