// src/services/openai.rs

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    config::{Config, MAX_QUALITY_SCORE, MIN_QUALITY_SCORE},
    models::intent::{Intent, IntentClassification, IntentContext},
    services::{IntentClassifier, Outcome, QualityScorer, SetupError},
};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client backing scoring, hints and intent classification.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    scoring_model: String,
    intent_model: String,
    score_pattern: Regex,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        base_url: String,
        scoring_model: String,
        intent_model: String,
        timeout: Duration,
    ) -> Result<Self, SetupError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url,
            scoring_model,
            intent_model,
            score_pattern: Regex::new(r"\d+")?,
        })
    }

    /// Builds a client from configuration, `None` when no API key is set.
    pub fn from_config(config: &Config) -> Result<Option<Self>, SetupError> {
        match &config.openai_api_key {
            Some(key) => Self::new(
                key.clone(),
                config.openai_base_url.clone(),
                config.scoring_model.clone(),
                config.intent_model.clone(),
                config.collaborator_timeout,
            )
            .map(Some),
            None => Ok(None),
        }
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("API error {}: {}", status, body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid response body: {}", e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| "no choices returned".to_string())
    }

    /// Pulls the first integer out of a model reply and clamps it to the score range.
    pub fn parse_score(&self, reply: &str) -> Option<u8> {
        let digits = self.score_pattern.find(reply)?;
        let value = digits.as_str().parse::<u64>().ok()?;
        Some(value.clamp(MIN_QUALITY_SCORE as u64, MAX_QUALITY_SCORE as u64) as u8)
    }
}

fn scoring_prompt(question: &str, answer: &str, guidelines: Option<&str>) -> String {
    let guidelines = guidelines
        .filter(|g| !g.trim().is_empty())
        .map(|g| format!("Quality Guidelines: {}\n\n", g))
        .unwrap_or_default();

    format!(
        "You are an AI quality evaluator. Score the quality of a response to a survey question.\n\n\
         Question: {question}\n\n\
         Response: {answer}\n\n\
         {guidelines}\
         Evaluate the response quality on a scale of 1-5, where:\n\
         1 = Very poor quality (minimal effort, irrelevant)\n\
         2 = Poor quality (short, vague, or partially irrelevant)\n\
         3 = Acceptable quality (addresses the question but lacks depth)\n\
         4 = Good quality (thoughtful, relevant, and somewhat detailed)\n\
         5 = Excellent quality (comprehensive, insightful, and very detailed)\n\n\
         Return only a single number from 1-5 representing your score."
    )
}

fn hint_prompt(question: &str, answer: &str, score: u8, guidelines: Option<&str>) -> String {
    let guidelines = guidelines
        .filter(|g| !g.trim().is_empty())
        .map(|g| format!("Quality Guidelines: {}\n\n", g))
        .unwrap_or_default();

    format!(
        "A survey participant answered a question and the answer scored {score} out of {MAX_QUALITY_SCORE}.\n\n\
         Question: {question}\n\n\
         Response: {answer}\n\n\
         {guidelines}\
         In one short, friendly sentence, suggest how the participant could make the answer more useful. \
         Do not repeat the question."
    )
}

fn intent_prompt(context: &IntentContext) -> String {
    format!(
        "You are an intent classifier for a survey application. Classify the user's message into one of:\n\
         1. ANSWER_QUESTION - the user is answering the current question (even if incomplete or low quality)\n\
         2. NAVIGATE_TO_QUESTION - the user wants to go to a specific question (\"go to question 3\")\n\
         3. REVISE_ANSWER - the user wants to revise a previous answer (\"revise question 2\")\n\
         4. SKIP_QUESTION - the user wants to skip the current question\n\
         5. SUBMIT_SURVEY - the user wants to submit the survey\n\
         6. SHOW_HELP - the user is asking for help or the available actions\n\
         7. UNKNOWN - the intent cannot be determined\n\n\
         For NAVIGATE_TO_QUESTION and REVISE_ANSWER put the question number in parameters.question_number; \
         set it to null for every other intent.\n\n\
         Current context:\n\
         - Current question index: {}\n\
         - Total questions: {}\n\
         - Survey completed: {}",
        context.current_question_index, context.total_questions, context.is_completed
    )
}

fn intent_schema() -> Value {
    let intents: Vec<&str> = Intent::ALL.iter().map(Intent::as_str).collect();

    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "IntentClassification",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "intent": { "type": "string", "enum": intents },
                    "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "question_number": {
                                "type": ["integer", "null"],
                                "minimum": 1,
                                "description": "The question number to navigate to or revise. Null for non-navigation intents."
                            }
                        },
                        "required": ["question_number"],
                        "additionalProperties": false
                    }
                },
                "required": ["intent", "confidence", "parameters"],
                "additionalProperties": false
            }
        }
    })
}

#[async_trait]
impl QualityScorer for OpenAiClient {
    async fn score_quality(
        &self,
        question: &str,
        answer: &str,
        guidelines: Option<&str>,
    ) -> Outcome<u8> {
        let request = ChatRequest {
            model: &self.scoring_model,
            messages: vec![ChatMessage {
                role: "user",
                content: scoring_prompt(question, answer, guidelines),
            }],
            temperature: 0.3,
            max_tokens: 10,
            response_format: None,
        };

        match self.complete(request).await {
            Ok(reply) => match self.parse_score(&reply) {
                Some(score) => Outcome::Available(score),
                None => Outcome::Unavailable(format!("unparseable score reply: {}", reply)),
            },
            Err(e) => Outcome::Unavailable(e),
        }
    }

    async fn generate_hint(
        &self,
        question: &str,
        answer: &str,
        score: u8,
        guidelines: Option<&str>,
    ) -> Outcome<String> {
        let request = ChatRequest {
            model: &self.scoring_model,
            messages: vec![ChatMessage {
                role: "user",
                content: hint_prompt(question, answer, score, guidelines),
            }],
            temperature: 0.5,
            max_tokens: 120,
            response_format: None,
        };

        match self.complete(request).await {
            Ok(hint) if !hint.is_empty() => Outcome::Available(hint),
            Ok(_) => Outcome::Unavailable("empty hint".to_string()),
            Err(e) => Outcome::Unavailable(e),
        }
    }
}

#[async_trait]
impl IntentClassifier for OpenAiClient {
    async fn classify_intent(
        &self,
        message: &str,
        context: &IntentContext,
    ) -> Outcome<IntentClassification> {
        let request = ChatRequest {
            model: &self.intent_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: intent_prompt(context),
                },
                ChatMessage {
                    role: "user",
                    content: message.to_string(),
                },
            ],
            temperature: 0.3,
            max_tokens: 150,
            response_format: Some(intent_schema()),
        };

        let reply = match self.complete(request).await {
            Ok(reply) => reply,
            Err(e) => return Outcome::Unavailable(e),
        };

        match serde_json::from_str::<IntentClassification>(&reply) {
            Ok(parsed) => Outcome::Available(IntentClassification::new(
                parsed.intent,
                parsed.confidence,
                parsed.parameters.question_number,
            )),
            Err(e) => Outcome::Unavailable(format!("malformed classification: {}", e)),
        }
    }
}
