// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    engine::{SessionAction, SessionEngine},
    error::AppError,
    models::response::{ActionKind, ChatMessageRequest, ParticipantRequest, SessionActionRequest},
};

/// Returns the current state of a session so a client can resume it.
pub async fn get_session(
    State(engine): State<SessionEngine>,
    Path(response_id): Path<String>,
    Query(query): Query<ParticipantRequest>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;

    let snapshot = engine.snapshot(&response_id, &query.participant_id).await?;

    Ok(Json(snapshot))
}

/// Handles answer / skip / navigate for a session.
///
/// * `answer` (default): scores and stores `answer`, optionally for `targetQuestionIndex`.
/// * `skip`: marks the current question skipped and steps forward.
/// * `navigate`: moves to `targetQuestionIndex`.
pub async fn handle_action(
    State(engine): State<SessionEngine>,
    Path(response_id): Path<String>,
    Json(req): Json<SessionActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let action = match req.action {
        ActionKind::Answer => SessionAction::Answer {
            text: req.answer.unwrap_or_default(),
            target: req.target_question_index,
        },
        ActionKind::Skip => SessionAction::Skip,
        ActionKind::Navigate => SessionAction::Navigate {
            target: req
                .target_question_index
                .ok_or(AppError::BadRequest("Invalid question index".to_string()))?,
        },
    };

    let outcome = engine
        .perform(&response_id, &req.participant_id, action)
        .await?;

    Ok(Json(outcome))
}

/// Explicit "Submit Survey" call, marks the response finished.
pub async fn submit_survey(
    State(engine): State<SessionEngine>,
    Path(response_id): Path<String>,
    Json(req): Json<ParticipantRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let outcome = engine.submit(&response_id, &req.participant_id).await?;

    Ok(Json(outcome))
}

/// Free-text conversational turn: classify the message, then act on it.
pub async fn handle_message(
    State(engine): State<SessionEngine>,
    Path(response_id): Path<String>,
    Json(req): Json<ChatMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let reply = engine
        .converse(&response_id, &req.participant_id, &req.message)
        .await?;

    Ok(Json(reply))
}
