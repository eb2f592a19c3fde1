use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{is_unique_violation, DbPool},
    error::AppError,
    models::profile::{ProfileUpdate, ProfileUser, ProfileView, UserProfile},
    services::storage::StorageService,
};

/// An uploaded avatar, not yet stored.
pub struct ImageUpload {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// Returns the user's profile, creating an empty one on first access.
pub async fn get_or_create(db: &DbPool, user_id: &str) -> Result<ProfileView, AppError> {
    let user = load_profile_user(db, user_id).await?;

    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO user_profiles (id, user_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?3)
           ON CONFLICT(user_id) DO NOTHING"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(now)
    .execute(db)
    .await?;

    let profile = load_profile(db, user_id).await?;
    Ok(ProfileView::new(profile, user))
}

pub async fn update(
    db: &DbPool,
    storage: &StorageService,
    user_id: &str,
    changes: ProfileUpdate,
    image: Option<ImageUpload>,
) -> Result<ProfileView, AppError> {
    let changes = ProfileUpdate {
        email: changes.email.map(|email| email.to_lowercase()),
        ..changes
    };
    changes.validate()?;
    let previous = load_profile_user(db, user_id).await?;

    let image_url = match image {
        Some(upload) => Some(
            storage
                .put_profile_image(
                    user_id,
                    upload.content_type.as_deref(),
                    upload.file_name.as_deref(),
                    &upload.data,
                )
                .await?,
        ),
        None => None,
    };

    if let Err(err) = write_changes(db, user_id, &changes, image_url.as_deref()).await {
        if let Some(url) = &image_url {
            storage.remove_by_url(url).await;
        }
        return Err(err);
    }

    if let (Some(_), Some(old)) = (&image_url, &previous.image) {
        storage.remove_by_url(old).await;
    }
    info!(user_id, new_image = image_url.is_some(), "profile updated");

    let user = load_profile_user(db, user_id).await?;
    let profile = load_profile(db, user_id).await?;
    Ok(ProfileView::new(profile, user))
}

async fn write_changes(
    db: &DbPool,
    user_id: &str,
    changes: &ProfileUpdate,
    image_url: Option<&str>,
) -> Result<(), AppError> {
    let now = Utc::now();
    let mut tx = db.begin().await?;
    sqlx::query(
        r#"UPDATE users SET
             name = COALESCE(?1, name),
             username = COALESCE(?2, username),
             email = COALESCE(?3, email),
             image = COALESCE(?4, image),
             updated_at = ?5
           WHERE id = ?6"#,
    )
    .bind(&changes.full_name)
    .bind(&changes.username)
    .bind(&changes.email)
    .bind(image_url)
    .bind(now)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::BadRequest("username or email is already taken".into())
        } else {
            err.into()
        }
    })?;

    sqlx::query(
        r#"INSERT INTO user_profiles (id, user_id, bio, location, website, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
           ON CONFLICT(user_id) DO UPDATE SET
             bio = excluded.bio,
             location = excluded.location,
             website = excluded.website,
             updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(&changes.bio)
    .bind(&changes.location)
    .bind(&changes.website)
    .bind(now)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

async fn load_profile_user(db: &DbPool, user_id: &str) -> Result<ProfileUser, AppError> {
    sqlx::query_as("SELECT name, email, image, username FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("User not found"))
}

async fn load_profile(db: &DbPool, user_id: &str) -> Result<UserProfile, AppError> {
    let profile = sqlx::query_as("SELECT * FROM user_profiles WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(profile)
}
