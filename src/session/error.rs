use thiserror::Error;

use crate::encoder::EncoderError;

/// Session-level error taxonomy
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("A session is already active")]
    AlreadyActive,

    #[error("Session has not been prepared")]
    NotPrepared,

    #[error("No active recording")]
    NoActiveRecording,

    #[error("Session is in a failed state; reset before reuse")]
    SessionFailed,

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncoderError),
}

pub type SessionResult<T> = Result<T, SessionError>;
