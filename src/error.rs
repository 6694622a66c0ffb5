use thiserror::Error;

use crate::session::SessionState;

/// Failures of the durable profile store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("could not encode or decode profile: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised by stores that were told to refuse writes (used to exercise
    /// degraded persistence).
    #[error("store is unavailable")]
    Unavailable,
}

/// Everything that can go wrong while handling a turn.
///
/// None of these reach the user verbatim: the dispatcher turns them into a
/// spoken fallback or apology.
#[derive(Debug, Error)]
pub enum SpellError {
    /// The turn is known but not allowed in the current state.
    #[error("{turn} is not accepted while {state}")]
    GuardMismatch { turn: String, state: SessionState },

    /// The report and the word list disagree.
    #[error("word {0:?} is not in the report")]
    UnknownWord(String),

    #[error("no phoneme for {0:?}")]
    UnsupportedLetter(char),

    #[error("{turn} needs a {slot:?} slot")]
    MissingSlot { turn: String, slot: &'static str },

    #[error("unknown event type {0:?}")]
    UnknownEvent(String),

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl SpellError {
    /// Whether this error means "I don't understand" rather than "something broke".
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            SpellError::GuardMismatch { .. } | SpellError::UnknownEvent(_)
        )
    }
}
