//! Error types for the exam core.
//!
//! Each component reports its own failures so the presentation layer can
//! tell a broken question bank apart from a rejected user action.

use thiserror::Error;

use crate::session::SessionStatus;

/// Failures while fetching or decoding the question bank.
///
/// Fatal to starting any exam; there is no partial or degraded pool.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be reached (missing file, connection refused, non-2xx).
    #[error("question source unreachable: {0}")]
    Unreachable(String),

    /// The document itself could not be decoded.
    #[error("malformed question source: {0}")]
    Malformed(String),

    /// A single record is missing a field or is internally inconsistent.
    #[error("question #{position}: {message}")]
    InvalidQuestion { position: usize, message: String },
}

/// Rejected exam actions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExamError {
    /// The pool is smaller than the exam size.
    #[error("only {available} questions available, {required} required")]
    InsufficientQuestions { available: usize, required: usize },

    /// An action was attempted against a session in the wrong state.
    #[error("cannot {action} while the exam is {status}")]
    InvalidTransition {
        action: &'static str,
        status: SessionStatus,
    },

    /// A question index outside the selected set.
    #[error("question index {index} out of range (exam has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The option key is not one of the current question's options.
    #[error("'{key}' is not an option of question {number}")]
    UnknownOption { key: String, number: usize },
}

impl ExamError {
    /// How many questions are missing for an exam to start, if that is the failure.
    pub fn shortfall(&self) -> Option<usize> {
        match self {
            ExamError::InsufficientQuestions {
                available,
                required,
            } => Some(required.saturating_sub(*available)),
            _ => None,
        }
    }
}

/// Rejected login input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("display name must not be empty")]
    EmptyName,

    #[error("department must not be empty")]
    EmptyDepartment,
}

/// Failures of the local persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored record could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend-specific failure.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`crate::controller::ExamController`].
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Exam(#[from] ExamError),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// `start_exam` needs an active profile to key the history by.
    #[error("no user is logged in")]
    NotLoggedIn,
}
