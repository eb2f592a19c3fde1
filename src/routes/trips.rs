use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::error;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{search::SearchRequest, trip::TripCompletion},
    routes::UserScope,
    services::{
        planner::{self, SearchOutcome},
        trips,
    },
    state::AppState,
    views::{RecentTripView, TripDetailView, TripHistoryView, TripSummaryView},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/recent", get(recent))
        .route("/history", get(history))
        .route("/search", post(search))
        .route("/:trip_id", get(detail))
        .route("/:trip_id/complete", post(complete))
}

async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(scope): Query<UserScope>,
) -> Result<Json<Vec<TripSummaryView>>, AppError> {
    let user = current.require_owner(scope.user_id.as_deref())?;
    let trips = trips::list_trips(&state.db, &user.id).await?;
    Ok(Json(trips.iter().map(TripSummaryView::from).collect()))
}

async fn recent(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(scope): Query<UserScope>,
) -> Result<Json<Vec<RecentTripView>>, AppError> {
    let user = current.require_owner(scope.user_id.as_deref())?;
    let trips = trips::recent_trips(&state.db, &user.id).await?;
    Ok(Json(trips.iter().map(RecentTripView::from).collect()))
}

async fn history(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(scope): Query<UserScope>,
) -> Result<Json<Vec<TripHistoryView>>, AppError> {
    let user = current.require_owner(scope.user_id.as_deref())?;
    let trips = trips::completed_trips(&state.db, &user.id).await?;
    Ok(Json(trips.iter().map(TripHistoryView::from).collect()))
}

async fn detail(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<String>,
    Query(scope): Query<UserScope>,
) -> Result<Json<TripDetailView>, AppError> {
    let user = current.require_owner(scope.user_id.as_deref())?;
    let trip = trips::find_trip(&state.db, &user.id, &trip_id)
        .await?
        .ok_or(AppError::NotFound("Trip not found"))?;
    Ok(Json(TripDetailView::from(&trip)))
}

async fn search(
    State(state): State<AppState>,
    current: CurrentUser,
    WithRejection(Json(request), _): WithRejection<Json<SearchRequest>, AppError>,
) -> Result<Json<SearchOutcome>, AppError> {
    let user_id = current.require_owner(request.user_id.as_deref())?.id.clone();
    match planner::search_trip(&state, &user_id, request).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(err) if err.is_internal() => {
            error!(%user_id, "trip search failed: {err:?}");
            Err(AppError::Internal("Failed to search trips"))
        }
        Err(err) => Err(err),
    }
}

async fn complete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<String>,
    WithRejection(Json(completion), _): WithRejection<Json<TripCompletion>, AppError>,
) -> Result<Json<TripDetailView>, AppError> {
    let user = current.require_owner(completion.user_id.as_deref())?;
    let trip = trips::complete_trip(&state.db, &user.id, &trip_id, completion).await?;
    Ok(Json(TripDetailView::from(&trip)))
}
