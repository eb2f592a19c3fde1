use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow)]
pub struct UserProfile {
    pub id: String,
    pub user_id: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of the owning user shown next to a profile.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProfileUser {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: String,
    pub user_id: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: ProfileUser,
}

impl ProfileView {
    pub fn new(profile: UserProfile, user: ProfileUser) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            bio: profile.bio,
            location: profile.location,
            website: profile.website,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            user,
        }
    }
}

/// Profile edits. User columns keep their value on `None`; the profile
/// columns are replaced as given.
#[derive(Debug, Clone, Default, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 80, message = "name must be 1-80 characters"))]
    pub full_name: Option<String>,
    #[validate(length(min = 3, max = 32, message = "username must be 3-32 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[validate(url(message = "website must be a valid URL"))]
    pub website: Option<String>,
}
