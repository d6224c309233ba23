// src/models/response.rs

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::{config::MAX_ANSWER_LENGTH, models::survey::PublicQuestion};

/// Current answers keyed by question id, in the order questions were first answered.
/// Re-answering a question replaces its entry in place.
pub type Answers = IndexMap<String, Answer>;

/// A participant's current answer to one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,

    /// Snapshot of the question text when the answer was given.
    pub question_text: String,

    pub answer_text: String,
    pub quality_score: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_hint: Option<String>,

    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// The session cursor. Indices are positions in the survey's question list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub current_question_index: usize,
    pub completed_questions: BTreeSet<usize>,
    pub skipped_questions: BTreeSet<usize>,
}

/// Represents the 'responses' table in the database: one participant session.
#[derive(Debug, Clone, FromRow)]
pub struct ResponseRecord {
    pub id: String,
    pub survey_id: String,
    pub participant_id: String,
    pub answers: Json<Answers>,
    pub session_data: Json<SessionData>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i64,
}

/// One-based position reported to clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn at(index: usize, total: usize) -> Self {
        Self {
            current: index + 1,
            total,
        }
    }
}

/// Returned by the start operation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedSession {
    pub session_id: String,
    pub participant_id: String,
    pub survey_title: String,
    pub current_question: PublicQuestion,
    pub progress: Progress,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub completed: bool,
    pub all_questions_answered: bool,
    pub next_question: Option<PublicQuestion>,
    pub quality_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_hint: Option<String>,
    pub session_data: SessionData,
    pub answers: Answers,
    pub progress: Progress,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipOutcome {
    pub completed: bool,
    pub next_question: Option<PublicQuestion>,
    pub session_data: SessionData,
    pub answers: Answers,
    pub progress: Progress,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateOutcome {
    pub completed: bool,
    pub next_question: PublicQuestion,
    /// Existing answer text for the target question, empty when unanswered.
    pub previous_answer: String,
    pub session_data: SessionData,
    pub answers: Answers,
    pub progress: Progress,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub completed: bool,
    pub message: String,
    pub session_id: String,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub answer_count: usize,
}

/// Result of any mutating action, tagged with what happened.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionOutcome {
    Answered(AnswerOutcome),
    Skipped(SkipOutcome),
    Navigated(NavigateOutcome),
    Submitted(SubmitOutcome),
}

/// Read-only view used to resume a session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub survey_id: String,
    pub current_question: Option<PublicQuestion>,
    pub session_data: SessionData,
    pub answers: Answers,
    pub progress: Progress,
    pub all_questions_answered: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    #[default]
    Answer,
    Skip,
    Navigate,
}

/// DTO for the combined answer / skip / navigate endpoint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SessionActionRequest {
    #[validate(length(min = 1, max = 64, message = "Participant ID is required"))]
    pub participant_id: String,
    #[serde(default)]
    pub action: ActionKind,
    #[validate(length(max = MAX_ANSWER_LENGTH))]
    pub answer: Option<String>,
    /// Signed so negative indices surface as invalid input rather than a decode failure.
    pub target_question_index: Option<i64>,
}

/// DTO carrying only the participant token.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRequest {
    #[validate(length(min = 1, max = 64, message = "Participant ID is required"))]
    pub participant_id: String,
}

/// DTO for a free-text conversational turn.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    #[validate(length(min = 1, max = 64, message = "Participant ID is required"))]
    pub participant_id: String,
    #[validate(length(min = 1, max = MAX_ANSWER_LENGTH))]
    pub message: String,
}
