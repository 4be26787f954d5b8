use thiserror::Error;

use super::task::TaskId;

/// Errors produced by registry and ledger operations.
///
/// [Validation](CoreError::Validation) failures come from bad user input and are
/// surfaced for display without mutating anything. The remaining variants signal
/// misuse of the core by the calling layer and should be treated as bugs there.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),

    /// Closing was requested for a task with no open session. Callers are
    /// expected to check `is_running` first.
    #[error("task has no open session")]
    NoOpenSession,

    #[error("no task with id {0}")]
    NotFound(TaskId),

    #[error("{0}")]
    InvalidState(&'static str),
}
