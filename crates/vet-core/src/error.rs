//! Error types for collaborator operations.

use thiserror::Error;

/// Errors returned by the conversational backend or the analysis service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The service is temporarily unavailable (network, 5xx).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected because a quota was exhausted.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The request could not be processed.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The media kind or operation is not supported by this backend.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The backend did not answer in time.
    #[error("backend timed out")]
    Timeout,

    /// The backend is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors returned by the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The message was rejected by the store.
    #[error("write rejected: {0}")]
    Rejected(String),
}
