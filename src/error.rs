//! Error types for filedock.

use thiserror::Error;
use tonic::{Code, Status};

/// Common error type for filedock.
#[derive(Error, Debug)]
pub enum FiledockError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller supplied a value the store refuses to act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// An admission pool is at capacity.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The peer broke the framing contract of a transfer stream.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Channel setup or connection failure.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Status returned by the remote end of a call.
    #[error("rpc error: {0}")]
    Rpc(#[from] Status),

    /// A call did not finish within its deadline.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl FiledockError {
    /// The RPC status code this error is reported with.
    pub fn code(&self) -> Code {
        match self {
            FiledockError::InvalidArgument(_) => Code::InvalidArgument,
            FiledockError::NotFound(_) => Code::NotFound,
            FiledockError::ResourceExhausted(_) => Code::ResourceExhausted,
            FiledockError::Timeout(_) => Code::DeadlineExceeded,
            FiledockError::Rpc(status) => status.code(),
            FiledockError::Io(_)
            | FiledockError::Config(_)
            | FiledockError::Protocol(_)
            | FiledockError::Transport(_) => Code::Internal,
        }
    }
}

impl From<FiledockError> for Status {
    fn from(e: FiledockError) -> Self {
        match e {
            FiledockError::Rpc(status) => status,
            other => Status::new(other.code(), other.to_string()),
        }
    }
}

/// Result type alias for filedock operations.
pub type Result<T> = std::result::Result<T, FiledockError>;
