use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{PrivateCookieJar, WithRejection};
use serde::Deserialize;

use crate::{
    auth::{self, AuthenticatedUser, CurrentUser, Signup},
    error::AppError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
}

async fn signup(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    WithRejection(Json(form), _): WithRejection<Json<Signup>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth::register_user(&state, &form).await?;
    let session_id = auth::create_session(&state, &user.id).await?;
    Ok((
        StatusCode::CREATED,
        auth::apply_session_cookie(jar, &session_id),
        Json(user),
    ))
}

#[derive(Deserialize)]
struct LoginForm {
    identifier: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    WithRejection(Json(form), _): WithRejection<Json<LoginForm>, AppError>,
) -> Result<(PrivateCookieJar, Json<AuthenticatedUser>), AppError> {
    let user = auth::authenticate_user(&state, &form.identifier, &form.password).await?;
    let session_id = auth::create_session(&state, &user.id).await?;
    Ok((auth::apply_session_cookie(jar, &session_id), Json(user)))
}

async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, StatusCode), AppError> {
    if let Some(cookie) = jar.get(auth::SESSION_COOKIE) {
        auth::destroy_session(&state, cookie.value()).await?;
    }
    Ok((auth::clear_session_cookie(jar), StatusCode::NO_CONTENT))
}

async fn session(current: CurrentUser) -> Result<Json<AuthenticatedUser>, AppError> {
    let user = current.require_user()?;
    Ok(Json(user.clone()))
}
