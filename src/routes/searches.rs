use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::search::SavedSearch,
    routes::UserScope,
    services::planner,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list))
}

async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(scope): Query<UserScope>,
) -> Result<Json<Vec<SavedSearch>>, AppError> {
    let user = current.require_owner(scope.user_id.as_deref())?;
    let searches = planner::list_saved_searches(&state.db, &user.id).await?;
    Ok(Json(searches))
}
