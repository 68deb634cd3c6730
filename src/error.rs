//! Unified error handling for jukebot.
//!
//! Two error domains: command handling (`HandlerError`) and the external
//! voice/streaming collaborators (`ProviderError`). Validation failures in
//! the dispatcher are not errors at all — dispatch fails closed and returns
//! `false` to its caller.

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur inside a command handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("reply channel closed: {0}")]
    Reply(#[from] mpsc::error::SendError<String>),

    /// The playback session actor is gone (its task exited).
    #[error("playback session unavailable")]
    SessionClosed,

    /// Graceful shutdown was requested (terminate command).
    #[error("shutdown requested")]
    Shutdown,

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Static error code for structured log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Reply(_) => "reply_closed",
            Self::SessionClosed => "session_closed",
            Self::Shutdown => "shutdown",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors surfaced by the voice/streaming collaborators.
///
/// These never propagate out of the playback session actor; they are logged
/// and the state is left recoverable via stop/leave.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to join voice channel: {0}")]
    Join(String),

    #[error("failed to open stream source: {0}")]
    Open(String),

    #[error("failed to start stream: {0}")]
    Play(String),

    #[error("provider call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_codes() {
        assert_eq!(HandlerError::Shutdown.error_code(), "shutdown");
        assert_eq!(HandlerError::SessionClosed.error_code(), "session_closed");
        assert_eq!(
            HandlerError::Internal("oops".into()).error_code(),
            "internal_error"
        );
    }
}
