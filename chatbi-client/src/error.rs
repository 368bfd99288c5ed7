//! Error types for the ChatBI client.

use thiserror::Error;

/// Transport and configuration errors.
///
/// Query-level failures (backend rejected the question, empty drill-down)
/// are not errors; they come back as the failure variant of the tagged
/// outcome types in [`crate::types`].
#[derive(Debug, Error)]
pub enum Error {
    /// The backend base URL is missing or not a valid URL.
    #[error("invalid ChatBI base URL: {0}")]
    InvalidBaseUrl(String),

    /// HTTP transport failure (connect, timeout, TLS).
    #[error("ChatBI request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status code.
    #[error("ChatBI returned status {status} for {endpoint}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected ChatBI response from {endpoint}: {detail}")]
    UnexpectedResponse {
        endpoint: &'static str,
        detail: String,
    },
}
