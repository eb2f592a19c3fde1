pub mod auth;
pub mod profile;
pub mod searches;
pub mod trips;

use axum::Router;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{services::storage::PUBLIC_PREFIX, state::AppState};

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/trips", trips::router())
        .nest("/searches", searches::router())
        .nest("/profile", profile::router());

    Router::new()
        .nest("/api", api)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(state.storage.root()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Optional `?userId=` a client may still send; it must name the session user.
#[derive(Debug, Default, Deserialize)]
pub struct UserScope {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}
