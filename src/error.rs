//! Error taxonomy for the admin engine.
//!
//! Three failure classes cross the engine boundary:
//! - [`ValidationError`]: bad input, surfaced before any remote call.
//! - [`EngineError::Conflict`]: duplicate template identity, recoverable only
//!   through an explicit overwrite confirmation.
//! - [`EngineError::Transport`]: network/server failure, original message
//!   preserved, the operation is considered not applied and is never retried
//!   automatically.
//!
//! Partial failure of a batch is not an error at all; batch operations return
//! a structured report instead.

use thiserror::Error;

/// Input validation failures. The offending literal travels in the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A time-of-day token that is not strict 24-hour `HH:mm`.
    #[error("invalid time segment \"{0}\": expected HH:mm between 00:00 and 23:59")]
    BadTimeSegment(String),

    /// One or more `HH:mm` values occur more than once in a config.
    #[error("duplicate time segments: {}", .0.join(", "))]
    DuplicateTimeSegments(Vec<String>),

    /// An allocation must size itself by exactly one of the two modes.
    #[error("exactly one of maxAmount and fundPercent must be set")]
    FundModeAmbiguous,

    /// Share counters are 1-based and must stay positive.
    #[error("{0} must be at least 1")]
    NonPositiveShares(&'static str),
}

/// Engine-level error emitted by the store client and the apply engines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Duplicate template identity. The message is the server's own wording
    /// (or the client pre-check's) and is shown to the operator before asking
    /// for overwrite confirmation.
    #[error("{0}")]
    Conflict(String),

    /// Network or server failure; the message is surfaced verbatim.
    #[error("{0}")]
    Transport(String),
}

impl EngineError {
    /// Whether this error is the recoverable duplicate-identity case.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Conflict(_))
    }
}
