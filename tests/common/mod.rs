// tests/common/mod.rs
#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::json;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use survey_session::{
    catalog,
    config::Config,
    engine::SessionEngine,
    models::{
        intent::{Intent, IntentClassification, IntentContext},
        survey::SurveySeed,
    },
    routes,
    services::{IntentClassifier, Outcome, QualityScorer, keyword::KeywordClassifier},
    state::AppState,
};

pub const SURVEY_ID: &str = "feedback-2026";
pub const EMPTY_SURVEY_ID: &str = "empty-survey";
pub const INACTIVE_SURVEY_ID: &str = "retired-survey";

/// A fresh in-memory database with migrations applied.
///
/// A single connection that never expires keeps the in-memory database alive
/// for the lifetime of the pool.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

/// Seeds a three-question survey, an empty one and an inactive one.
pub async fn seed(pool: &SqlitePool) {
    let seeds: Vec<SurveySeed> = serde_json::from_value(json!([
        {
            "uniqueId": SURVEY_ID,
            "title": "Product Feedback",
            "description": "Tell us about the tool",
            "questions": [
                { "text": "What do you like most?", "qualityGuidelines": "Mention a concrete feature" },
                { "text": "What would you improve?" },
                { "text": "Would you recommend it?" }
            ]
        },
        {
            "uniqueId": EMPTY_SURVEY_ID,
            "title": "Nothing to ask",
            "questions": []
        },
        {
            "uniqueId": INACTIVE_SURVEY_ID,
            "title": "Old survey",
            "isActive": false,
            "questions": [{ "text": "Still there?" }]
        }
    ]))
    .expect("Invalid seed fixture");

    catalog::seed_surveys(pool, &seeds)
        .await
        .expect("Failed to seed surveys");
}

/// Always scores the same and always offers the same hint.
pub struct FixedScorer {
    pub score: u8,
    pub hint: &'static str,
}

#[async_trait]
impl QualityScorer for FixedScorer {
    async fn score_quality(&self, _: &str, _: &str, _: Option<&str>) -> Outcome<u8> {
        Outcome::Available(self.score)
    }

    async fn generate_hint(&self, _: &str, _: &str, _: u8, _: Option<&str>) -> Outcome<String> {
        Outcome::Available(self.hint.to_string())
    }
}

/// Every call reports the backend as unavailable.
pub struct FailingScorer;

#[async_trait]
impl QualityScorer for FailingScorer {
    async fn score_quality(&self, _: &str, _: &str, _: Option<&str>) -> Outcome<u8> {
        Outcome::Unavailable("backend down".to_string())
    }

    async fn generate_hint(&self, _: &str, _: &str, _: u8, _: Option<&str>) -> Outcome<String> {
        Outcome::Unavailable("backend down".to_string())
    }
}

/// Answers correctly, but only after `delay`.
pub struct SlowScorer {
    pub delay: Duration,
}

#[async_trait]
impl QualityScorer for SlowScorer {
    async fn score_quality(&self, _: &str, _: &str, _: Option<&str>) -> Outcome<u8> {
        tokio::time::sleep(self.delay).await;
        Outcome::Available(5)
    }

    async fn generate_hint(&self, _: &str, _: &str, _: u8, _: Option<&str>) -> Outcome<String> {
        tokio::time::sleep(self.delay).await;
        Outcome::Available("late hint".to_string())
    }
}

/// Every classification reports the backend as unavailable.
pub struct FailingClassifier;

#[async_trait]
impl IntentClassifier for FailingClassifier {
    async fn classify_intent(&self, _: &str, _: &IntentContext) -> Outcome<IntentClassification> {
        Outcome::Unavailable("backend down".to_string())
    }
}

/// Classifies everything as a skip, but only after `delay`.
pub struct SlowClassifier {
    pub delay: Duration,
}

#[async_trait]
impl IntentClassifier for SlowClassifier {
    async fn classify_intent(&self, _: &str, _: &IntentContext) -> Outcome<IntentClassification> {
        tokio::time::sleep(self.delay).await;
        Outcome::Available(IntentClassification::new(
            Intent::SkipQuestion,
            0.9,
            None,
        ))
    }
}

/// Engine with a fixed scorer and the given classifier.
pub fn engine_with_classifier(
    pool: &SqlitePool,
    classifier: Arc<dyn IntentClassifier>,
    timeout: Duration,
) -> SessionEngine {
    let scorer = Arc::new(FixedScorer {
        score: 4,
        hint: "Add a concrete example.",
    });
    SessionEngine::new(pool.clone(), scorer, classifier, timeout)
}

pub fn engine_with(
    pool: &SqlitePool,
    scorer: Arc<dyn QualityScorer>,
    timeout: Duration,
) -> SessionEngine {
    let classifier = KeywordClassifier::new().expect("Invalid keyword patterns");
    SessionEngine::new(pool.clone(), scorer, Arc::new(classifier), timeout)
}

/// Engine over a seeded database, scoring every answer 4 with a fixed hint.
pub async fn seeded_engine() -> (SessionEngine, SqlitePool) {
    let pool = test_pool().await;
    seed(&pool).await;
    let scorer = Arc::new(FixedScorer {
        score: 4,
        hint: "Add a concrete example.",
    });
    (engine_with(&pool, scorer, Duration::from_secs(2)), pool)
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["*".to_string()],
        log_dir: "logs".to_string(),
        openai_api_key: None,
        openai_base_url: "https://api.openai.com/v1".to_string(),
        scoring_model: "gpt-3.5-turbo".to_string(),
        intent_model: "gpt-4o-2024-08-06".to_string(),
        collaborator_timeout: Duration::from_secs(2),
        survey_seed_file: None,
    }
}

pub async fn test_app() -> axum::Router {
    let (engine, pool) = seeded_engine().await;
    routes::create_router(AppState {
        pool,
        config: test_config(),
        engine,
    })
}

/// Spawns the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
pub async fn spawn_app() -> String {
    let app = test_app().await;

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}
