// src/engine/store.rs

//! Persistence of response sessions.
//!
//! Writes are optimistic: each one names the `version` it was computed from
//! and only applies if the row still carries it and is not completed.

use sqlx::{Sqlite, SqlitePool, Transaction, types::Json};

use crate::{
    engine::SessionError,
    models::response::{Answers, ResponseRecord, SessionData},
};

pub async fn insert_response(
    pool: &SqlitePool,
    id: &str,
    survey_id: &str,
    participant_id: &str,
    session_data: &SessionData,
    started_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO responses (id, survey_id, participant_id, answers, session_data, started_at, updated_at, version)
        VALUES (?, ?, ?, ?, ?, ?, ?, 0)
        "#,
    )
    .bind(id)
    .bind(survey_id)
    .bind(participant_id)
    .bind(Json(Answers::new()))
    .bind(Json(session_data))
    .bind(started_at)
    .bind(started_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_response(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<ResponseRecord>, sqlx::Error> {
    sqlx::query_as::<_, ResponseRecord>(
        r#"
        SELECT id, survey_id, participant_id, answers, session_data, started_at, completed_at, version
        FROM responses
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Writes answers and cursor together, or neither.
pub async fn save_progress(
    pool: &SqlitePool,
    id: &str,
    expected_version: i64,
    answers: &Answers,
    session_data: &SessionData,
) -> Result<(), SessionError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE responses
        SET answers = ?, session_data = ?, updated_at = ?, version = version + 1
        WHERE id = ? AND version = ? AND completed_at IS NULL
        "#,
    )
    .bind(Json(answers))
    .bind(Json(session_data))
    .bind(chrono::Utc::now())
    .bind(id)
    .bind(expected_version)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(reject(tx, id).await);
    }

    tx.commit().await?;
    Ok(())
}

/// Sets `completed_at`, making the session terminal.
pub async fn mark_completed(
    pool: &SqlitePool,
    id: &str,
    expected_version: i64,
    completed_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), SessionError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE responses
        SET completed_at = ?, updated_at = ?, version = version + 1
        WHERE id = ? AND version = ? AND completed_at IS NULL
        "#,
    )
    .bind(completed_at)
    .bind(completed_at)
    .bind(id)
    .bind(expected_version)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(reject(tx, id).await);
    }

    tx.commit().await?;
    Ok(())
}

/// Works out why a conditional update matched nothing, then rolls back.
async fn reject(mut tx: Transaction<'_, Sqlite>, id: &str) -> SessionError {
    let state = sqlx::query_scalar::<_, Option<chrono::DateTime<chrono::Utc>>>(
        "SELECT completed_at FROM responses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await;

    if let Err(e) = tx.rollback().await {
        tracing::error!("Failed to roll back rejected write for {}: {:?}", id, e);
    }

    match state {
        Ok(None) => SessionError::NotFound("Response session not found".to_string()),
        Ok(Some(Some(_))) => SessionError::AlreadySubmitted,
        Ok(Some(None)) => {
            tracing::warn!(session_id = %id, "Concurrent modification detected");
            SessionError::Conflict
        }
        Err(e) => SessionError::Storage(e),
    }
}
