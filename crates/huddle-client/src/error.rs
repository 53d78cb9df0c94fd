use thiserror::Error;

use huddle_shared::{IntlMessage, ServerError};
use huddle_store::StoredError;

/// Errors produced by the REST client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never got an HTTP response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Server error: {0}")]
    Server(ServerError),

    /// The body could not be decoded as the expected JSON.
    #[error("Invalid response: {}", .0.default_message)]
    InvalidResponse(IntlMessage),

    /// The caller cancelled the request before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// A request body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local I/O, e.g. reading a file to upload.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status of a server error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Server(err) => Some(err.status_code),
            _ => None,
        }
    }

    /// Flatten into the shape kept in the request table. Server and intl
    /// errors keep their structure; everything else keeps its message.
    pub fn to_stored(&self) -> StoredError {
        match self {
            ClientError::Server(err) => StoredError::Server(err.clone()),
            ClientError::InvalidResponse(msg) => StoredError::Intl(msg.clone()),
            other => StoredError::Message(other.to_string()),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
