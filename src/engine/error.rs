use thiserror::Error;

use crate::model::mode::{EventKind, Mode};

/// Failure of the upstream chat model call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("could not reach the model server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("the model server rejected the credentials (HTTP {0})")]
    Auth(u16),

    #[error("the model server is out of quota")]
    Quota,

    #[error("the model server answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected reply from the model server: {0}")]
    Malformed(String),
}

/// A marker the model emitted without the data it needs.
/// Always recovered with a fallback; never reaches the player as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedDirective {
    #[error("{0} marker without any event text")]
    MissingEventPayload(EventKind),

    #[error("unknown ending kind {0:?}")]
    UnknownEnding(String),
}

/// Player input that does not fit the current session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTurnInput {
    #[error("the game is over, restart to play again")]
    GameOver,

    #[error("a {input} is not accepted during {mode} mode")]
    WrongMode { mode: Mode, input: &'static str },

    #[error("input is empty")]
    EmptyInput,

    #[error("the game has already been opened")]
    AlreadyStarted,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Invalid(#[from] InvalidTurnInput),

    /// The error entry has already been added to the transcript.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
