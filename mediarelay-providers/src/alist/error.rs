//! Alist client errors

use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

use crate::error::ProviderClientError;

#[derive(Debug, Error)]
pub enum AlistError {
    #[error("Alist request failed: {0}")]
    Upstream(#[from] ProviderClientError),

    /// The JSON envelope carried a non-200 `code`
    #[error("Alist API error (code {code}): {message}")]
    Api { code: u64, message: String },

    #[error("Alist response has no {0}")]
    MissingData(String),

    /// The download route answered with something other than a redirect.
    #[error("Expected a redirect from {url}, got {status}")]
    UnexpectedStatus { status: reqwest::StatusCode, url: String },

    #[error("Redirect from {url} has no usable Location header")]
    MissingLocation { url: String },

    #[error("Token is not a valid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("Invalid signing secret: {0}")]
    Signing(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for AlistError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.into())
    }
}
