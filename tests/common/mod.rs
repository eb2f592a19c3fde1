#![allow(dead_code)]

use std::{
    fmt,
    fs::File,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use anyhow::Context;
use async_trait::async_trait;
use itinera::{
    config::{AppConfig, GeminiConfig},
    db::{init_pool, run_migrations},
    error::AppError,
    services::{recommender::TripRecommender, storage::StorageService},
    state::AppState,
};
use tempfile::TempDir;

/// Recommender that replays a canned answer and records the prompts it saw.
#[derive(Default)]
pub struct StubRecommender {
    reply: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl StubRecommender {
    pub fn reply_with(&self, text: impl Into<String>) {
        *self.reply.lock().expect("reply lock") = Some(text.into());
    }

    pub fn fail(&self) {
        *self.reply.lock().expect("reply lock") = None;
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt lock").clone()
    }
}

#[async_trait]
impl TripRecommender for StubRecommender {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts
            .lock()
            .expect("prompt lock")
            .push(prompt.to_string());
        self.reply
            .lock()
            .expect("reply lock")
            .clone()
            .ok_or_else(|| AppError::Upstream("stub model is offline".into()))
    }
}

/// A model answer with a budget totalling 12,500 and `days` itinerary days,
/// listed in reverse so callers can check they come back ordered.
pub fn recommendation_json(days: u32, mode: &str) -> String {
    let itinerary: Vec<_> = (1..=days)
        .rev()
        .map(|day| {
            serde_json::json!({
                "day": day,
                "activities": [format!("Activity for day {day}")],
                "notes": format!("Notes for day {day}"),
            })
        })
        .collect();
    let body = serde_json::json!({
        "tripRecommendation": {
            "duration": days,
            "budgetBreakdown": {
                "accommodation": 6000,
                "transportation": 2500,
                "activities": 1500,
                "food": 2000,
                "miscellaneous": 500
            },
            "modeOfTravel": mode,
            "activities": ["Sightseeing", "Local food walk"],
            "itinerary": itinerary,
            "tips": ["Carry cash", "Start early"]
        }
    });
    format!("```json\n{body}\n```")
}

pub struct TestApp {
    pub state: AppState,
    pub recommender: Arc<StubRecommender>,
    _root: TempDir,
}

impl fmt::Debug for TestApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestApp").finish()
    }
}

impl TestApp {
    pub async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for test app")?;
        let upload_root = root.path().join("uploads");

        let db_path = root.path().join("itinera.sqlite");
        File::create(&db_path)?;
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            upload_root: upload_root.clone(),
            cookie_secret: "test-cookie-secret".into(),
            session_ttl: chrono::Duration::hours(1),
            gemini: GeminiConfig::new("unused-in-tests"),
        };

        let db = init_pool(&config.database_url).await?;
        run_migrations(&db).await?;

        let storage = StorageService::new(upload_root);
        storage.ensure_structure().await?;

        let recommender = Arc::new(StubRecommender::default());
        let state = AppState::new(config, db, storage, recommender.clone());
        Ok(Self {
            state,
            recommender,
            _root: root,
        })
    }
}
