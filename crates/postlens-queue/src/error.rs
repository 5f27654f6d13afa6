use thiserror::Error;

/// Failures of the serializer itself, as opposed to the work it runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("queued task ended without an outcome")]
    Abandoned,
}

/// Failures of a single HTTP-like request.
///
/// The retry policy treats every variant the same way; callers that need
/// per-kind handling inspect the error after the final attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

impl RequestError {
    /// The HTTP status, if this is a status failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}

pub type RequestResult<T> = Result<T, RequestError>;
