//! Stream error types.

use thiserror::Error;

pub type StreamResult<T> = Result<T, StreamError>;

#[derive(Debug, Error)]
pub enum StreamError {
    /// The subscription could not be opened.
    #[error("Could not open progress stream: {0}")]
    Connect(#[from] reqwest::Error),

    /// The backend refused the subscription outright.
    #[error("Progress stream refused with status {0}")]
    Refused(u16),

    /// The transport died mid-stream: the job's true state is unknown.
    ///
    /// Distinct from a backend-reported failure, which is authoritative.
    #[error("Progress stream connection lost: {0}")]
    ConnectionLost(String),
}
