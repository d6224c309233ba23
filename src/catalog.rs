// src/catalog.rs

//! Read access to surveys and their ordered questions, plus boot-time seeding.
//! Questions are immutable while sessions walk through them.

use std::path::Path;

use sqlx::SqlitePool;
use validator::Validate;

use crate::models::survey::{PublicQuestion, PublicSurvey, Question, Survey, SurveySeed};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid survey '{unique_id}': {errors}")]
    Validation {
        unique_id: String,
        errors: validator::ValidationErrors,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Finds a survey by its public id, only if it is active.
pub async fn find_active_survey(
    pool: &SqlitePool,
    unique_id: &str,
) -> Result<Option<Survey>, sqlx::Error> {
    sqlx::query_as::<_, Survey>(
        r#"
        SELECT id, unique_id, title, description, is_active, created_at
        FROM surveys
        WHERE unique_id = ? AND is_active = 1
        "#,
    )
    .bind(unique_id)
    .fetch_optional(pool)
    .await
}

/// Questions of a survey in presentation order.
pub async fn list_questions(
    pool: &SqlitePool,
    survey_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, survey_id, position, text, quality_guidelines
        FROM questions
        WHERE survey_id = ?
        ORDER BY position ASC
        "#,
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await
}

/// Participant-facing view of an active survey.
pub async fn public_survey(
    pool: &SqlitePool,
    unique_id: &str,
) -> Result<Option<PublicSurvey>, sqlx::Error> {
    let Some(survey) = find_active_survey(pool, unique_id).await? else {
        return Ok(None);
    };

    let questions = list_questions(pool, &survey.id).await?;

    Ok(Some(PublicSurvey {
        id: survey.id,
        unique_id: survey.unique_id,
        title: survey.title,
        description: survey.description,
        questions: questions.iter().map(PublicQuestion::from).collect(),
    }))
}

pub async fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<SurveySeed>, SeedError> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Inserts surveys that do not exist yet, one transaction per survey.
/// Returns the number of surveys created.
pub async fn seed_surveys(pool: &SqlitePool, seeds: &[SurveySeed]) -> Result<usize, SeedError> {
    let mut created = 0;

    for seed in seeds {
        seed.validate().map_err(|errors| SeedError::Validation {
            unique_id: seed.unique_id.clone(),
            errors,
        })?;

        let mut tx = pool.begin().await?;

        let exists = sqlx::query_scalar::<_, String>("SELECT id FROM surveys WHERE unique_id = ?")
            .bind(&seed.unique_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_some() {
            tracing::debug!("Survey '{}' already present, skipping", seed.unique_id);
            continue;
        }

        let survey_id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO surveys (id, unique_id, title, description, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&survey_id)
        .bind(&seed.unique_id)
        .bind(&seed.title)
        .bind(&seed.description)
        .bind(seed.is_active)
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await?;

        for (position, question) in seed.questions.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO questions (id, survey_id, position, text, quality_guidelines)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&survey_id)
            .bind(position as i64)
            .bind(&question.text)
            .bind(&question.quality_guidelines)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Seeded survey '{}' with {} questions",
            seed.unique_id,
            seed.questions.len()
        );
        created += 1;
    }

    Ok(created)
}
