use thiserror::Error;

/// Failure of a profile or wallet fetch. `Unavailable` covers transport and
/// HTTP-status failures and is worth retrying; `Malformed` means the response
/// arrived but did not have the expected shape.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Lens API unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected Lens API response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}

/// Failure of a single message delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint rejected the request itself. Retrying the same request
    /// will not succeed.
    #[error("message rejected (status {status}): {message}")]
    ClientRejected { status: u16, message: String },

    /// Network or server-side failure. Safe to retry.
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// The credential was rejected. No send can succeed until it is refreshed.
    #[error("credential rejected by the message endpoint")]
    Unauthorized,
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Transient(err.to_string())
    }
}
