use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::is_unique_violation,
    error::AppError,
    models::{
        session::Session,
        user::{User, UserRole},
    },
    state::AppState,
};

pub const SESSION_COOKIE: &str = "itinera_session";

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        let role = user.role();
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            role,
        }
    }
}

/// The session user, if the request carries a live session cookie.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(Self(Some(user.clone())));
        }

        let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };

        let user = resolve_session(state, cookie.value()).await?;
        if let Some(user) = &user {
            parts.extensions.insert(user.clone());
        }
        Ok(Self(user))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }

    /// Like [`require_user`](Self::require_user), but also rejects a
    /// client-supplied user id that names somebody else.
    pub fn require_owner(&self, claimed: Option<&str>) -> Result<&AuthenticatedUser, AppError> {
        let user = self.require_user()?;
        match claimed.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) if id != user.id => Err(AppError::Forbidden),
            _ => Ok(user),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Signup {
    #[validate(length(min = 1, max = 80, message = "name must be 1-80 characters"))]
    pub name: String,
    #[validate(length(min = 3, max = 32, message = "username must be 3-32 characters"))]
    pub username: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

pub async fn register_user(state: &AppState, signup: &Signup) -> Result<AuthenticatedUser, AppError> {
    let signup = Signup {
        name: signup.name.trim().to_string(),
        username: signup.username.trim().to_string(),
        email: signup.email.trim().to_lowercase(),
        password: signup.password.clone(),
    };
    signup.validate()?;

    let password_hash = hash_password(&signup.password)?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: signup.name,
        username: signup.username,
        email: signup.email,
        password_hash,
        image: None,
        role: UserRole::User.as_str().to_string(),
        created_at: now,
        updated_at: now,
    };

    let inserted = sqlx::query(
        r#"INSERT INTO users (id, name, username, email, password_hash, image, role, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.image)
    .bind(&user.role)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&state.db)
    .await;

    match inserted {
        Ok(_) => {
            info!(user_id = %user.id, "registered new user");
            Ok(user.into())
        }
        Err(err) if is_unique_violation(&err) => Err(AppError::BadRequest(
            "username or email is already taken".into(),
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn authenticate_user(
    state: &AppState,
    identifier: &str,
    password: &str,
) -> Result<AuthenticatedUser, AppError> {
    let identifier = identifier.trim();
    if identifier.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "identifier and password are required".into(),
        ));
    }

    let user: Option<User> = sqlx::query_as(
        "SELECT * FROM users WHERE username = ?1 OR email = lower(?1) LIMIT 1",
    )
    .bind(identifier)
    .fetch_optional(&state.db)
    .await?;
    let Some(user) = user else {
        return Err(AppError::Unauthorized);
    };

    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|err| AppError::Other(anyhow::anyhow!("stored password hash is invalid: {err}")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        debug!(user_id = %user.id, "password mismatch");
        return Err(AppError::Unauthorized);
    }

    Ok(user.into())
}

pub async fn create_session(state: &AppState, user_id: &str) -> Result<String, AppError> {
    let session_id = format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    );
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO sessions (id, user_id, created_at, last_seen_at, expires_at)
           VALUES (?1, ?2, ?3, ?3, ?4)"#,
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(now)
    .bind(now + state.config.session_ttl)
    .execute(&state.db)
    .await?;
    Ok(session_id)
}

pub async fn destroy_session(state: &AppState, session_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = ?1")
        .bind(session_id)
        .execute(&state.db)
        .await?;
    Ok(())
}

/// Looks up a live session. Expired sessions are deleted on sight.
pub async fn resolve_session(
    state: &AppState,
    session_id: &str,
) -> Result<Option<AuthenticatedUser>, AppError> {
    let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = ?1")
        .bind(session_id)
        .fetch_optional(&state.db)
        .await?;
    let Some(session) = session else {
        return Ok(None);
    };

    let now = Utc::now();
    if session.is_expired(now) {
        debug!(user_id = %session.user_id, "dropping expired session");
        destroy_session(state, &session.id).await?;
        return Ok(None);
    }

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?1")
        .bind(&session.user_id)
        .fetch_optional(&state.db)
        .await?;
    let Some(user) = user else {
        return Ok(None);
    };

    sqlx::query("UPDATE sessions SET last_seen_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(&session.id)
        .execute(&state.db)
        .await?;

    Ok(Some(user.into()))
}

pub fn apply_session_cookie(jar: PrivateCookieJar, session_id: &str) -> PrivateCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Other(anyhow::anyhow!("password hashing failed: {err}")))
}
