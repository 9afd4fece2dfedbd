use crate::storage::BufferError;
use thiserror::Error;

/// Errors that can occur while forwarding a batch.
///
/// Every variant is transient from the engine's point of view: the batch stays
/// unconsumed and is retried after a backoff.
#[derive(Debug, Error)]
pub enum EventForwardError {
    /// Network request failed, or the body could not be read
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Server returned a non-2XX status code
    #[error("server returned status {status}: {body}")]
    Server { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("decode response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// Well-formed response reporting failure
    #[error("server returned success=false")]
    Rejected,

    /// Reading the batch, or marking it consumed after the server accepted it
    #[error("activity buffer: {0}")]
    Storage(#[from] BufferError),
}

impl EventForwardError {
    /// Create a server error from response details
    pub fn server_error(status: u16, body: String) -> Self {
        EventForwardError::Server { status, body }
    }
}

/// Result type for event forwarding operations
pub type EventForwardResult<T> = Result<T, EventForwardError>;
