// src/handlers/survey.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    catalog,
    engine::SessionEngine,
    error::AppError,
    models::intent::ClassifyIntentRequest,
};

/// Public fetch of an active survey and its questions.
pub async fn get_survey(
    State(pool): State<SqlitePool>,
    Path(unique_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let survey = catalog::public_survey(&pool, &unique_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch survey {}: {:?}", unique_id, e);
            AppError::from(e)
        })?
        .ok_or(AppError::NotFound("Survey not found or inactive".to_string()))?;

    Ok(Json(survey))
}

/// Starts a new response session.
///
/// Returns 201 Created with the session id, the participant token that must
/// accompany every later action, and the first question.
pub async fn start_session(
    State(engine): State<SessionEngine>,
    Path(unique_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let started = engine.start(&unique_id).await?;

    Ok((StatusCode::CREATED, Json(started)))
}

/// Classifies a free-text message without touching any session.
pub async fn classify_intent(
    State(engine): State<SessionEngine>,
    Json(req): Json<ClassifyIntentRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let classification = engine.classify(&req.message, &req.context).await;

    Ok(Json(classification))
}
