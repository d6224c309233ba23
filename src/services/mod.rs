// src/services/mod.rs

//! External text-evaluation collaborators.
//!
//! Every call returns an [`Outcome`] instead of an error: a collaborator that
//! cannot answer says so, and the session engine picks the degraded default.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::Config,
    models::intent::{IntentClassification, IntentContext},
    services::{keyword::KeywordClassifier, openai::OpenAiClient},
};

pub mod keyword;
pub mod openai;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result of a collaborator call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Available(T),
    Unavailable(String),
}

/// Scores answers and suggests improvements.
#[async_trait]
pub trait QualityScorer: Send + Sync {
    /// Score in `[MIN_QUALITY_SCORE, MAX_QUALITY_SCORE]`.
    async fn score_quality(
        &self,
        question: &str,
        answer: &str,
        guidelines: Option<&str>,
    ) -> Outcome<u8>;

    /// Only called for answers scoring below the maximum.
    async fn generate_hint(
        &self,
        question: &str,
        answer: &str,
        score: u8,
        guidelines: Option<&str>,
    ) -> Outcome<String>;
}

/// Maps free text to a participant intent.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify_intent(
        &self,
        message: &str,
        context: &IntentContext,
    ) -> Outcome<IntentClassification>;
}

/// Scorer used when no scoring backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineScorer;

#[async_trait]
impl QualityScorer for OfflineScorer {
    async fn score_quality(&self, _: &str, _: &str, _: Option<&str>) -> Outcome<u8> {
        Outcome::Unavailable("no scoring backend configured".to_string())
    }

    async fn generate_hint(&self, _: &str, _: &str, _: u8, _: Option<&str>) -> Outcome<String> {
        Outcome::Unavailable("no hint backend configured".to_string())
    }
}

/// The scoring and intent collaborators selected by configuration.
pub struct Collaborators {
    pub scorer: Arc<dyn QualityScorer>,
    pub classifier: Arc<dyn IntentClassifier>,
}

impl Collaborators {
    /// Uses the chat-completions backend when an API key is configured,
    /// otherwise the offline scorer and the keyword classifier.
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        match OpenAiClient::from_config(config)? {
            Some(client) => {
                tracing::info!(
                    "Using {} for scoring and {} for intent classification",
                    config.scoring_model,
                    config.intent_model
                );
                let client = Arc::new(client);
                Ok(Self {
                    scorer: client.clone(),
                    classifier: client,
                })
            }
            None => {
                tracing::warn!(
                    "OPENAI_API_KEY not set: answers get the neutral score and intents use keyword matching"
                );
                Ok(Self {
                    scorer: Arc::new(OfflineScorer),
                    classifier: Arc::new(KeywordClassifier::new()?),
                })
            }
        }
    }
}
