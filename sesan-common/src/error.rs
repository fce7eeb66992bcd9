//! Common error types for SESAN

use serde::Deserialize;
use thiserror::Error;

/// Common result type for SESAN operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the SESAN client crates
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service responded with a non-success status
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    /// No stored session, or credentials rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Error body shape used by the analysis service (`{"detail": "..."}`)
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: String,
}

/// Map a non-success response into [`Error::Api`], extracting the service's
/// `detail` message when the body carries one. Success responses pass through.
pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.detail)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::NotFound(detail));
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Auth(detail));
    }

    Err(Error::Api {
        status: status.as_u16(),
        detail,
    })
}
