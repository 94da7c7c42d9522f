//! Error taxonomy for calls against the arena backend.

use thiserror::Error;

/// Coarse classification used by the polling boundary when logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection refused, timeout, or non-2xx status
    Network,
    /// Payload does not match the expected shape
    Decode,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Decode => write!(f, "decode"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid payload: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) | ClientError::Status { .. } => ErrorKind::Network,
            ClientError::Decode(_) => ErrorKind::Decode,
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        ClientError::Decode(format!("missing field `{}`", field))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}
