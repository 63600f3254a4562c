use thiserror::Error;

/// Failure of a backend call. Every variant is terminal for the operation
/// that produced it; nothing in this crate retries.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The backend answered with a non-success status
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16, body: String },

    /// The request never produced a response (connect, timeout, body read)
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the JSON we expected
    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
}

impl NetworkError {
    /// HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
