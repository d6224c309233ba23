// src/engine/cursor.rs

//! Pure cursor transitions. Each function takes the previous [`SessionData`]
//! and returns the next one; nothing here touches storage.

use std::collections::BTreeSet;

use crate::{
    engine::SessionError,
    models::{
        response::{Answers, SessionData},
        survey::Question,
    },
};

/// Validates a client-supplied question index against the survey length.
pub fn resolve_index(target: i64, total: usize) -> Result<usize, SessionError> {
    usize::try_from(target)
        .ok()
        .filter(|index| *index < total)
        .ok_or_else(|| SessionError::invalid("Invalid question index"))
}

/// Indices whose question has a stored answer with non-empty trimmed text.
pub fn recompute_completed(questions: &[Question], answers: &Answers) -> BTreeSet<usize> {
    questions
        .iter()
        .enumerate()
        .filter(|(_, q)| {
            answers
                .get(&q.id)
                .is_some_and(|a| !a.answer_text.trim().is_empty())
        })
        .map(|(index, _)| index)
        .collect()
}

pub fn all_questions_answered(data: &SessionData, total: usize) -> bool {
    total > 0 && data.completed_questions.len() == total
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerTransition {
    pub data: SessionData,
    pub all_questions_answered: bool,
}

/// Cursor after an answer was stored for `acting`.
///
/// When `editing` (the answer targeted a question other than the current one)
/// the cursor stays put. Otherwise it moves to the first index after `acting`
/// that is not completed, holding at `acting` when none remains.
pub fn after_answer(
    previous: &SessionData,
    acting: usize,
    editing: bool,
    completed: BTreeSet<usize>,
    total: usize,
) -> AnswerTransition {
    let current_question_index = if editing {
        previous.current_question_index
    } else {
        (acting + 1..total)
            .find(|index| !completed.contains(index))
            .unwrap_or(acting)
    };

    let data = SessionData {
        current_question_index: current_question_index.min(total.saturating_sub(1)),
        completed_questions: completed,
        skipped_questions: previous.skipped_questions.clone(),
    };
    let all_questions_answered = all_questions_answered(&data, total);

    AnswerTransition {
        data,
        all_questions_answered,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipTransition {
    pub data: SessionData,
    /// `None` when the skipped question was the last one.
    pub next_index: Option<usize>,
}

/// Marks the current question skipped and steps forward by exactly one.
/// Completed questions are not jumped over.
pub fn after_skip(previous: &SessionData, total: usize) -> SkipTransition {
    let current = previous.current_question_index;
    let mut skipped_questions = previous.skipped_questions.clone();
    skipped_questions.insert(current);

    let next_index = Some(current + 1).filter(|next| *next < total);

    SkipTransition {
        data: SessionData {
            current_question_index: next_index.unwrap_or(current),
            completed_questions: previous.completed_questions.clone(),
            skipped_questions,
        },
        next_index,
    }
}

/// Repositions the cursor. Completion and skip sets are carried over untouched.
pub fn after_navigate(previous: &SessionData, target: usize) -> SessionData {
    SessionData {
        current_question_index: target,
        ..previous.clone()
    }
}
