//! Session error types and user-facing message translation.
//!
//! The session layer is the only place internal error kinds become text a
//! user sees; raw transport errors never leave this boundary.

use thiserror::Error;

use vedit_client::ClientError;
use vedit_stream::StreamError;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// A job is already live; at most one may exist per session.
    #[error("A processing job is already running")]
    JobAlreadyLive,

    /// No video has been loaded into the session.
    #[error("No video is loaded")]
    NoVideo,

    /// The current video exists client-side only.
    #[error("The current video has not been uploaded to the backend")]
    VideoNotUploaded,

    /// Cancellation requested outside the processing phase.
    #[error("Cancel is only available while a job is processing")]
    NotProcessing,

    /// Processing options failed validation.
    #[error("Invalid processing options: {0}")]
    InvalidOptions(String),

    /// A backend interaction failed; the message is user-facing.
    #[error("{0}")]
    Backend(String),
}

impl SessionError {
    pub(crate) fn from_client(e: ClientError) -> Self {
        Self::Backend(user_message_for_client(&e))
    }

    pub(crate) fn from_stream(e: StreamError) -> Self {
        Self::Backend(user_message_for_stream(&e))
    }
}

/// Map a client error to a user-facing message.
///
/// Structured backend rejections are surfaced verbatim; everything else gets
/// a stable, non-technical description.
pub(crate) fn user_message_for_client(e: &ClientError) -> String {
    match e {
        ClientError::Transport(_) => {
            "Could not reach the processing service. Check your connection and try again."
                .to_string()
        }
        ClientError::Rejected { reason, .. } => reason.clone(),
        ClientError::NotFound(_) => {
            "The processing job is no longer known to the server.".to_string()
        }
        ClientError::MalformedResponse(_) => {
            "The processing service returned an unexpected response.".to_string()
        }
    }
}

pub(crate) fn user_message_for_stream(e: &StreamError) -> String {
    match e {
        StreamError::Connect(_) | StreamError::Refused(_) => {
            "Could not subscribe to processing progress.".to_string()
        }
        StreamError::ConnectionLost(_) => {
            "Lost the connection to processing progress.".to_string()
        }
    }
}
