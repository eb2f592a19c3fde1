use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("recommendation failed: {0}")]
    Upstream(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("{0}")]
    Internal(&'static str),
    #[error("invalid input")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
}

/// One failed check on one request field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl AppError {
    pub fn invalid(field: &str, code: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, code, message)])
    }

    /// Failures the client cannot fix by changing its request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Io(_)
                | AppError::Database(_)
                | AppError::Upstream(_)
                | AppError::Other(_)
                | AppError::Internal(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Upstream(_)
            | AppError::Other(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, failures)| {
                failures.iter().map(move |failure| FieldError {
                    field: camel_case(field),
                    code: failure.code.to_string(),
                    message: failure
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", camel_case(field))),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field).then(a.code.cmp(&b.code)));
        AppError::Validation(details)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let text = err.body_text();
                AppError::Validation(vec![FieldError::new(
                    &rejected_field(&text),
                    "type",
                    text,
                )])
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

/// Pulls the field path out of a serde rejection such as
/// `...target type: budget: invalid type: ...`. Falls back to `body`.
fn rejected_field(text: &str) -> String {
    text.split_once("target type: ")
        .and_then(|(_, rest)| rest.split_once(": "))
        .map(|(path, _)| path.trim())
        .filter(|path| !path.is_empty() && !path.contains(' '))
        .unwrap_or("body")
        .to_string()
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(details) => json!({
                "error": "Invalid input",
                "details": details,
            }),
            AppError::Internal(message) => {
                json!({ "error": message })
            }
            err if err.is_internal() => {
                error!("request failed: {err:?}");
                json!({ "error": "Internal server error" })
            }
            err => json!({ "error": err.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
