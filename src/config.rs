use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use crate::error::AppError;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub upload_root: PathBuf,
    pub cookie_secret: String,
    pub session_ttl: chrono::Duration,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://itinera.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let upload_root = env::var("UPLOAD_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-itinera-development-cookie-secret".to_string());

        let session_hours = parse_number("SESSION_TTL_HOURS", 168)?;

        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Config("GEMINI_API_KEY must be set".into()))?;
        let mut gemini = GeminiConfig::new(api_key);
        if let Ok(model) = env::var("GEMINI_MODEL") {
            gemini.model = model;
        }
        if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
            url::Url::parse(&base_url)
                .map_err(|err| AppError::Config(format!("invalid GEMINI_BASE_URL: {err}")))?;
            gemini.base_url = base_url.trim_end_matches('/').to_string();
        }
        gemini.timeout = Duration::from_secs(parse_number("GEMINI_TIMEOUT_SECS", 60)?);

        Ok(Self {
            database_url,
            listen_addr,
            upload_root,
            cookie_secret,
            session_ttl: chrono::Duration::hours(session_hours as i64),
            gemini,
        })
    }
}

fn parse_number(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|err| AppError::Config(format!("invalid {name}: {err}"))),
        Err(_) => Ok(default),
    }
}
