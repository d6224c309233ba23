// src/engine/session.rs

use std::{future::Future, sync::Arc, time::Duration};

use sqlx::SqlitePool;

use crate::{
    catalog,
    config::{MAX_QUALITY_SCORE, MIN_QUALITY_SCORE, NEUTRAL_QUALITY_SCORE},
    engine::{
        SessionAction, SessionError, cursor,
        dispatch::{self, Directive},
        store,
    },
    models::{
        intent::{ChatOutcome, ChatReply, IntentClassification, IntentContext},
        response::{
            ActionOutcome, Answer, AnswerOutcome, Answers, NavigateOutcome, Progress,
            ResponseRecord, SessionData, SessionSnapshot, SkipOutcome, StartedSession,
            SubmitOutcome,
        },
        survey::{PublicQuestion, Question},
    },
    services::{IntentClassifier, Outcome, QualityScorer},
    utils::token::{generate_participant_token, generate_session_id},
};

/// Owns the session protocol: start, answer, skip, navigate, submit.
///
/// Every operation is a self-contained read-modify-write against the stored
/// response row, so the engine is cheap to clone and holds no per-session state.
#[derive(Clone)]
pub struct SessionEngine {
    pool: SqlitePool,
    scorer: Arc<dyn QualityScorer>,
    classifier: Arc<dyn IntentClassifier>,
    collaborator_timeout: Duration,
}

/// A response row together with the questions it walks through.
struct LoadedSession {
    record: ResponseRecord,
    questions: Vec<Question>,
}

impl LoadedSession {
    fn total(&self) -> usize {
        self.questions.len()
    }

    fn data(&self) -> &SessionData {
        &self.record.session_data.0
    }

    fn answers(&self) -> &Answers {
        &self.record.answers.0
    }

    fn public_question(&self, index: usize) -> Option<PublicQuestion> {
        self.questions.get(index).map(PublicQuestion::from)
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.record.completed_at.is_some() {
            return Err(SessionError::AlreadySubmitted);
        }
        Ok(())
    }
}

impl SessionEngine {
    pub fn new(
        pool: SqlitePool,
        scorer: Arc<dyn QualityScorer>,
        classifier: Arc<dyn IntentClassifier>,
        collaborator_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            scorer,
            classifier,
            collaborator_timeout,
        }
    }

    /// Opens a new session on an active survey and presents its first question.
    pub async fn start(&self, unique_id: &str) -> Result<StartedSession, SessionError> {
        let survey = catalog::find_active_survey(&self.pool, unique_id)
            .await?
            .ok_or_else(|| SessionError::NotFound("Survey not found or inactive".to_string()))?;

        let questions = catalog::list_questions(&self.pool, &survey.id).await?;
        let first = questions.first().ok_or_else(|| {
            tracing::warn!("Survey '{}' has no questions, refusing to start", unique_id);
            SessionError::NoQuestions
        })?;

        let session_id = generate_session_id();
        let participant_id = generate_participant_token();

        store::insert_response(
            &self.pool,
            &session_id,
            &survey.id,
            &participant_id,
            &SessionData::default(),
            chrono::Utc::now(),
        )
        .await?;

        tracing::info!(
            session_id = %session_id,
            survey_id = %survey.id,
            "Survey session started"
        );

        Ok(StartedSession {
            session_id,
            participant_id,
            survey_title: survey.title,
            current_question: PublicQuestion::from(first),
            progress: Progress::at(0, questions.len()),
        })
    }

    /// Stores an answer for the current question, or for `target` when editing.
    pub async fn answer(
        &self,
        session_id: &str,
        participant_id: &str,
        text: &str,
        target: Option<i64>,
    ) -> Result<AnswerOutcome, SessionError> {
        let session = self.load(session_id, participant_id).await?;
        session.ensure_in_progress()?;

        let total = session.total();
        let previous = session.data();
        let acting = match target {
            Some(target) => cursor::resolve_index(target, total)?,
            None => previous.current_question_index,
        };
        let question = session
            .questions
            .get(acting)
            .ok_or_else(|| SessionError::invalid("No current question found"))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::invalid("Answer is required for submission"));
        }

        // Collaborators run before any write so a slow backend never holds the row.
        let (quality_score, improvement_hint) = self.assess(question, text).await;

        let mut answers = session.answers().clone();
        answers.insert(
            question.id.clone(),
            Answer {
                question_id: question.id.clone(),
                question_text: question.text.clone(),
                answer_text: text.to_string(),
                quality_score,
                improvement_hint: improvement_hint.clone(),
                timestamp: chrono::Utc::now(),
            },
        );

        let editing = target.is_some() && acting != previous.current_question_index;
        let completed = cursor::recompute_completed(&session.questions, &answers);
        let transition = cursor::after_answer(previous, acting, editing, completed, total);

        store::save_progress(
            &self.pool,
            &session.record.id,
            session.record.version,
            &answers,
            &transition.data,
        )
        .await?;

        tracing::debug!(
            session_id = %session_id,
            question_index = acting,
            quality_score,
            next_index = transition.data.current_question_index,
            "Answer recorded"
        );

        let next_question = if transition.all_questions_answered {
            None
        } else {
            session.public_question(transition.data.current_question_index)
        };

        Ok(AnswerOutcome {
            completed: false,
            all_questions_answered: transition.all_questions_answered,
            next_question,
            quality_score,
            improvement_hint,
            progress: Progress::at(transition.data.current_question_index, total),
            session_data: transition.data,
            answers,
        })
    }

    /// Marks the current question skipped and steps to the next one.
    pub async fn skip(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<SkipOutcome, SessionError> {
        let session = self.load(session_id, participant_id).await?;
        session.ensure_in_progress()?;

        let total = session.total();
        if total == 0 {
            return Err(SessionError::invalid("No current question found"));
        }

        let transition = cursor::after_skip(session.data(), total);

        store::save_progress(
            &self.pool,
            &session.record.id,
            session.record.version,
            session.answers(),
            &transition.data,
        )
        .await?;

        tracing::debug!(
            session_id = %session_id,
            skipped = session.data().current_question_index,
            "Question skipped"
        );

        Ok(SkipOutcome {
            completed: false,
            next_question: transition
                .next_index
                .and_then(|index| session.public_question(index)),
            progress: Progress::at(transition.data.current_question_index, total),
            session_data: transition.data,
            answers: session.answers().clone(),
        })
    }

    /// Moves the cursor to `target` and returns any existing answer for pre-fill.
    pub async fn navigate(
        &self,
        session_id: &str,
        participant_id: &str,
        target: i64,
    ) -> Result<NavigateOutcome, SessionError> {
        let session = self.load(session_id, participant_id).await?;
        session.ensure_in_progress()?;

        let total = session.total();
        let index = cursor::resolve_index(target, total)?;
        let question = &session.questions[index];
        let session_data = cursor::after_navigate(session.data(), index);

        store::save_progress(
            &self.pool,
            &session.record.id,
            session.record.version,
            session.answers(),
            &session_data,
        )
        .await?;

        let previous_answer = session
            .answers()
            .get(&question.id)
            .map(|a| a.answer_text.clone())
            .unwrap_or_default();

        Ok(NavigateOutcome {
            completed: false,
            next_question: PublicQuestion::from(question),
            previous_answer,
            session_data,
            answers: session.answers().clone(),
            progress: Progress::at(index, total),
        })
    }

    /// Finalizes the session. Requires at least one non-empty answer.
    pub async fn submit(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<SubmitOutcome, SessionError> {
        let session = self.load(session_id, participant_id).await?;
        session.ensure_in_progress()?;

        let has_valid_answers = session
            .answers()
            .values()
            .any(|a| !a.answer_text.trim().is_empty());
        if !has_valid_answers {
            return Err(SessionError::invalid(
                "Please provide at least one answer before submitting the survey",
            ));
        }

        let completed_at = chrono::Utc::now();
        store::mark_completed(
            &self.pool,
            &session.record.id,
            session.record.version,
            completed_at,
        )
        .await?;

        let answer_count = session.answers().len();
        tracing::info!(session_id = %session_id, answer_count, "Survey submitted");

        Ok(SubmitOutcome {
            completed: true,
            message: "Survey completed successfully".to_string(),
            session_id: session.record.id,
            completed_at,
            answer_count,
        })
    }

    /// Read-only view of a session, allowed in any state.
    pub async fn snapshot(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.load(session_id, participant_id).await?;
        let data = session.data().clone();
        let total = session.total();
        let all_questions_answered = cursor::all_questions_answered(&data, total);

        Ok(SessionSnapshot {
            session_id: session.record.id.clone(),
            survey_id: session.record.survey_id.clone(),
            current_question: session.public_question(data.current_question_index),
            progress: Progress::at(data.current_question_index, total),
            all_questions_answered,
            answers: session.answers().clone(),
            session_data: data,
            started_at: session.record.started_at,
            completed_at: session.record.completed_at,
        })
    }

    /// Runs one typed action.
    pub async fn perform(
        &self,
        session_id: &str,
        participant_id: &str,
        action: SessionAction,
    ) -> Result<ActionOutcome, SessionError> {
        match action {
            SessionAction::Answer { text, target } => self
                .answer(session_id, participant_id, &text, target)
                .await
                .map(ActionOutcome::Answered),
            SessionAction::Skip => self
                .skip(session_id, participant_id)
                .await
                .map(ActionOutcome::Skipped),
            SessionAction::Navigate { target } => self
                .navigate(session_id, participant_id, target)
                .await
                .map(ActionOutcome::Navigated),
            SessionAction::Submit => self
                .submit(session_id, participant_id)
                .await
                .map(ActionOutcome::Submitted),
        }
    }

    /// Classifies free text, degrading to `UNKNOWN` when the classifier fails.
    pub async fn classify(&self, message: &str, context: &IntentContext) -> IntentClassification {
        self.bounded("intent", self.classifier.classify_intent(message, context))
            .await
            .unwrap_or_else(IntentClassification::unknown)
    }

    /// Handles one free-text turn: classify, then dispatch into at most one action.
    pub async fn converse(
        &self,
        session_id: &str,
        participant_id: &str,
        message: &str,
    ) -> Result<ChatReply, SessionError> {
        let session = self.load(session_id, participant_id).await?;
        let current_index = session.data().current_question_index;
        let context = IntentContext {
            current_question_index: current_index,
            total_questions: session.total(),
            is_completed: session.record.completed_at.is_some(),
        };

        let classification = self.classify(message, &context).await;
        tracing::debug!(
            session_id = %session_id,
            intent = classification.intent.as_str(),
            confidence = classification.confidence,
            "Classified participant message"
        );

        let current_question = session.public_question(current_index);
        let outcome = match dispatch::resolve(&classification, message, &context) {
            Directive::Perform(action) => self
                .perform(session_id, participant_id, action)
                .await?
                .into(),
            Directive::Help => ChatOutcome::Help {
                actions: dispatch::help_entries(),
                current_question,
            },
            Directive::Reprompt(reason) => ChatOutcome::Reprompt {
                message: reason.to_string(),
                current_question,
            },
        };

        Ok(ChatReply {
            intent: classification.intent,
            confidence: classification.confidence,
            outcome,
        })
    }

    async fn load(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<LoadedSession, SessionError> {
        let record = store::find_response(&self.pool, session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound("Response session not found".to_string()))?;

        if record.participant_id != participant_id {
            tracing::warn!(session_id = %session_id, "Participant token mismatch");
            return Err(SessionError::Unauthorized);
        }

        let questions = catalog::list_questions(&self.pool, &record.survey_id).await?;

        Ok(LoadedSession { record, questions })
    }

    /// Scores an answer and, below the maximum, asks for an improvement hint.
    async fn assess(&self, question: &Question, text: &str) -> (u8, Option<String>) {
        let guidelines = question.quality_guidelines.as_deref();

        let score = self
            .bounded(
                "scoring",
                self.scorer.score_quality(&question.text, text, guidelines),
            )
            .await
            .map(|score| score.clamp(MIN_QUALITY_SCORE, MAX_QUALITY_SCORE))
            .unwrap_or(NEUTRAL_QUALITY_SCORE);

        if score >= MAX_QUALITY_SCORE {
            return (score, None);
        }

        let hint = self
            .bounded(
                "hint",
                self.scorer
                    .generate_hint(&question.text, text, score, guidelines),
            )
            .await
            .filter(|hint| !hint.trim().is_empty());

        (score, hint)
    }

    /// Runs a collaborator call under the configured timeout.
    async fn bounded<T>(&self, collaborator: &str, call: impl Future<Output = Outcome<T>>) -> Option<T> {
        match tokio::time::timeout(self.collaborator_timeout, call).await {
            Ok(Outcome::Available(value)) => Some(value),
            Ok(Outcome::Unavailable(reason)) => {
                tracing::warn!(collaborator, %reason, "Collaborator unavailable, using degraded default");
                None
            }
            Err(_) => {
                tracing::warn!(
                    collaborator,
                    timeout_ms = self.collaborator_timeout.as_millis() as u64,
                    "Collaborator timed out, using degraded default"
                );
                None
            }
        }
    }
}
