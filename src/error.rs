use thiserror::Error;

use crate::Millis;

/// Everything that can go wrong while handling a single key event.
///
/// All variants are recoverable: the controller stays in a defined state and
/// the caller decides whether to surface a diagnostic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HoldError {
    #[error("a timing session is already active")]
    AlreadyActive,
    #[error("no timing session is active")]
    NotActive,
    #[error("clock went backwards: session started at {started_at} ms, released at {now} ms")]
    NonMonotonicClock { started_at: Millis, now: Millis },
    #[error("invalid key binding: {0:?}")]
    InvalidBinding(String),
}

pub type Result<T> = std::result::Result<T, HoldError>;
