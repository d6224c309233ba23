// src/engine/mod.rs

//! The survey response session engine.
//!
//! Every client surface, structured form or free-text chat, ends up calling
//! one of the typed operations on [`SessionEngine`].

pub mod cursor;
pub mod dispatch;
mod session;
pub mod store;

pub use session::SessionEngine;

/// Errors raised by session operations. Validation failures are raised before
/// any write, so the stored session is unchanged whenever one is returned.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid participant ID")]
    Unauthorized,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Survey has already been submitted")]
    AlreadySubmitted,

    #[error("Survey has no questions")]
    NoQuestions,

    #[error("Session was modified by another request, please retry")]
    Conflict,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl SessionError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SessionError::InvalidInput(message.into())
    }
}

/// A typed participant action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Answer the current question, or the question at `target` when editing.
    Answer { text: String, target: Option<i64> },
    Skip,
    Navigate { target: i64 },
    Submit,
}
