// src/config.rs

use std::{env, time::Duration};

use dotenvy::dotenv;
use url::Url;

/// Lowest score the quality collaborator may award.
pub const MIN_QUALITY_SCORE: u8 = 1;

/// Highest score; answers scoring below this are eligible for an improvement hint.
pub const MAX_QUALITY_SCORE: u8 = 5;

/// Score recorded when the scoring collaborator is unavailable.
pub const NEUTRAL_QUALITY_SCORE: u8 = 3;

/// Upper bound on the length of a single answer.
pub const MAX_ANSWER_LENGTH: u64 = 10_000;

const DEFAULT_DATABASE_URL: &str = "sqlite://survey.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SCORING_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_INTENT_MODEL: &str = "gpt-4o-2024-08-06";
const DEFAULT_COLLABORATOR_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub log_dir: String,

    /// When unset the service runs with the offline collaborators.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub scoring_model: String,
    pub intent_model: String,

    /// Bound applied to every scoring, hint and intent call.
    pub collaborator_timeout: Duration,

    /// Optional JSON file of surveys inserted at boot.
    pub survey_seed_file: Option<String>,
}

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// Malformed values fall back to their defaults. Each fallback is described
    /// in the returned warnings, to be logged once tracing is initialized.
    pub fn from_env() -> (Self, Vec<String>) {
        dotenv().ok();

        let mut warnings = Vec::new();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
        );

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let openai_base_url = parse_base_url(env::var("OPENAI_BASE_URL").ok().as_deref(), &mut warnings);

        let scoring_model =
            env::var("SCORING_MODEL").unwrap_or_else(|_| DEFAULT_SCORING_MODEL.to_string());

        let intent_model =
            env::var("INTENT_MODEL").unwrap_or_else(|_| DEFAULT_INTENT_MODEL.to_string());

        let collaborator_timeout =
            parse_timeout(
            env::var("COLLABORATOR_TIMEOUT_SECS").ok().as_deref(),
            &mut warnings,
        );

        let survey_seed_file = env::var("SURVEY_SEED_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty());

        let config = Self {
            database_url,
            rust_log,
            bind_addr,
            cors_origins,
            log_dir,
            openai_api_key,
            openai_base_url,
            scoring_model,
            intent_model,
            collaborator_timeout,
            survey_seed_file,
        };

        (config, warnings)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_base_url(raw: Option<&str>, warnings: &mut Vec<String>) -> String {
    match raw.map(|value| value.trim().trim_end_matches('/')) {
        Some(value) => match Url::parse(value) {
            Ok(_) => value.to_string(),
            Err(e) => {
                warnings.push(format!("Ignoring invalid OPENAI_BASE_URL '{}': {}", value, e));
                DEFAULT_OPENAI_BASE_URL.to_string()
            }
        },
        None => DEFAULT_OPENAI_BASE_URL.to_string(),
    }
}

fn parse_timeout(raw: Option<&str>, warnings: &mut Vec<String>) -> Duration {
    let secs = raw
        .and_then(|value| match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Some(secs),
            _ => {
                warnings.push(format!("Ignoring invalid COLLABORATOR_TIMEOUT_SECS '{}'", value));
                None
            }
        })
        .unwrap_or(DEFAULT_COLLABORATOR_TIMEOUT_SECS);

    Duration::from_secs(secs)
}
