use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::profile::{ProfileUpdate, ProfileView},
    routes::UserScope,
    services::profiles::{self, ImageUpload},
    state::AppState,
};

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(show)
            .post(update)
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    user_profile: ProfileView,
}

async fn show(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(scope): Query<UserScope>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = current.require_owner(scope.user_id.as_deref())?;
    let user_profile = profiles::get_or_create(&state.db, &user.id).await?;
    Ok(Json(ProfileResponse { user_profile }))
}

async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ProfileResponse>, AppError> {
    current.require_user()?;
    let mut changes = ProfileUpdate::default();
    let mut claimed_user = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let content_type = field.content_type().map(str::to_string);
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await?;
            // Browsers send an empty part when no file was picked.
            if !data.is_empty() {
                image = Some(ImageUpload {
                    content_type,
                    file_name,
                    data: data.to_vec(),
                });
            }
            continue;
        }

        let value = non_blank(field.text().await?);
        match name.as_str() {
            "userId" => claimed_user = value,
            "fullName" => changes.full_name = value,
            "username" => changes.username = value,
            "email" => changes.email = value,
            "bio" => changes.bio = value,
            "location" => changes.location = value,
            "website" => changes.website = value,
            _ => {}
        }
    }

    let user = current.require_owner(claimed_user.as_deref())?;
    let user_profile =
        profiles::update(&state.db, &state.storage, &user.id, changes, image).await?;
    Ok(Json(ProfileResponse { user_profile }))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
