// src/models/intent.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    config::MAX_ANSWER_LENGTH,
    models::{
        response::{ActionOutcome, AnswerOutcome, NavigateOutcome, SkipOutcome, SubmitOutcome},
        survey::PublicQuestion,
    },
};

/// What a participant wants to do with a free-text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    AnswerQuestion,
    NavigateToQuestion,
    ReviseAnswer,
    SkipQuestion,
    SubmitSurvey,
    ShowHelp,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::AnswerQuestion,
        Intent::NavigateToQuestion,
        Intent::ReviseAnswer,
        Intent::SkipQuestion,
        Intent::SubmitSurvey,
        Intent::ShowHelp,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::AnswerQuestion => "ANSWER_QUESTION",
            Intent::NavigateToQuestion => "NAVIGATE_TO_QUESTION",
            Intent::ReviseAnswer => "REVISE_ANSWER",
            Intent::SkipQuestion => "SKIP_QUESTION",
            Intent::SubmitSurvey => "SUBMIT_SURVEY",
            Intent::ShowHelp => "SHOW_HELP",
            Intent::Unknown => "UNKNOWN",
        }
    }
}

/// Parameters extracted alongside an intent.
/// `question_number` is 1-based and always present on the wire, null for
/// intents that do not target a question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentParameters {
    pub question_number: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
    pub parameters: IntentParameters,
}

impl IntentClassification {
    pub fn new(intent: Intent, confidence: f64, question_number: Option<i64>) -> Self {
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
            parameters: IntentParameters { question_number },
        }
    }

    /// Classification used when the classifier fails or times out.
    pub fn unknown() -> Self {
        Self::new(Intent::Unknown, 0.0, None)
    }
}

/// Session context handed to the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentContext {
    pub current_question_index: usize,
    pub total_questions: usize,
    pub is_completed: bool,
}

/// DTO for the standalone classification endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct ClassifyIntentRequest {
    #[validate(length(min = 1, max = MAX_ANSWER_LENGTH))]
    pub message: String,
    #[serde(default)]
    pub context: IntentContext,
}

/// One entry of the help listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpEntry {
    pub action: String,
    pub usage: String,
}

/// Reply to a free-text turn.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub intent: Intent,
    pub confidence: f64,
    #[serde(flatten)]
    pub outcome: ChatOutcome,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum ChatOutcome {
    Answered(AnswerOutcome),
    Skipped(SkipOutcome),
    Navigated(NavigateOutcome),
    Submitted(SubmitOutcome),
    #[serde(rename_all = "camelCase")]
    Help {
        actions: Vec<HelpEntry>,
        current_question: Option<PublicQuestion>,
    },
    #[serde(rename_all = "camelCase")]
    Reprompt {
        message: String,
        current_question: Option<PublicQuestion>,
    },
}

impl From<ActionOutcome> for ChatOutcome {
    fn from(outcome: ActionOutcome) -> Self {
        match outcome {
            ActionOutcome::Answered(o) => ChatOutcome::Answered(o),
            ActionOutcome::Skipped(o) => ChatOutcome::Skipped(o),
            ActionOutcome::Navigated(o) => ChatOutcome::Navigated(o),
            ActionOutcome::Submitted(o) => ChatOutcome::Submitted(o),
        }
    }
}
