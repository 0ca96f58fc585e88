//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No response reached the client.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend explicitly declined the request.
    #[error("Backend rejected the request ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// The job or video is no longer known server-side.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend broke its response contract.
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    pub(crate) fn rejected(status: u16, reason: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
