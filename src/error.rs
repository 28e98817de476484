//! Error types for chain execution.

use thiserror::Error;

/// The crate's own error type.
///
/// Chains are generic over the error their steps produce; this type is the
/// default choice for that parameter and is also returned when an
/// [`Outcome`](crate::Outcome) or [`ExecutionReport`](crate::ExecutionReport)
/// cannot be converted into what the caller asked for.
#[derive(Error, Debug)]
pub enum Error {
    /// A value was requested from a chain that was aborted.
    #[error("Chain was aborted before producing a value")]
    Aborted,

    /// A value was requested from a chain that produced no output.
    #[error("Chain produced no output")]
    NoOutput,

    /// A JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A generic error with a message.
    #[error("{0}")]
    Message(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Message(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Message(msg.to_string())
    }
}

/// A specialized `Result` type for chain operations.
pub type Result<T> = std::result::Result<T, Error>;
