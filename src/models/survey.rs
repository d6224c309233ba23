// src/models/survey.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'surveys' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: String,

    /// Public identifier used in shareable links.
    pub unique_id: String,

    pub title: String,
    pub description: Option<String>,

    /// Inactive surveys cannot be started.
    pub is_active: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub survey_id: String,

    /// Zero-based order within the survey.
    pub position: i64,

    pub text: String,

    /// Free text handed to the scoring collaborator, never shown to participants.
    pub quality_guidelines: Option<String>,
}

/// DTO for sending a question to a participant (excludes quality guidelines).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub position: i64,
    pub text: String,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            position: q.position,
            text: q.text.clone(),
        }
    }
}

/// Public view of an active survey.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSurvey {
    pub id: String,
    pub unique_id: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<PublicQuestion>,
}

/// Survey definition read from the seed file at boot.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SurveySeed {
    #[validate(length(min = 1, max = 64), custom(function = validate_unique_id))]
    pub unique_id: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[validate(nested)]
    pub questions: Vec<QuestionSeed>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSeed {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[validate(length(max = 2000))]
    pub quality_guidelines: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Static path segments under `/api/survey` that shadow `/{unique_id}`.
const RESERVED_UNIQUE_IDS: [&str; 2] = ["intent", "response"];

fn validate_unique_id(unique_id: &str) -> Result<(), validator::ValidationError> {
    if RESERVED_UNIQUE_IDS.contains(&unique_id) {
        return Err(validator::ValidationError::new("reserved_unique_id"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(unique_id: &str) -> SurveySeed {
        SurveySeed {
            unique_id: unique_id.to_string(),
            title: "Title".to_string(),
            description: None,
            is_active: true,
            questions: vec![QuestionSeed {
                text: "Question?".to_string(),
                quality_guidelines: None,
            }],
        }
    }

    #[test]
    fn test_reserved_unique_ids_rejected() {
        for reserved in RESERVED_UNIQUE_IDS {
            let errors = seed(reserved).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("unique_id"));
        }
        assert!(seed("intent-survey").validate().is_ok());
    }
}
