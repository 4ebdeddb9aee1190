//! Failures shared by both provider clients
//!
//! Transport, status and decoding problems look the same whichever upstream
//! produced them, so the Emby and Alist errors wrap this type.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Largest JSON body accepted from an upstream API (16 MiB)
pub const MAX_JSON_BODY: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProviderClientError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("{url} answered {status}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("Response body of {size} bytes exceeds {MAX_JSON_BODY} bytes")]
    ResponseTooLarge { size: u64 },
}

impl From<reqwest::Error> for ProviderClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Reject non-2xx responses, then decode the body as JSON.
///
/// The declared length is checked before reading and the real length after.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderClientError::Http {
            status,
            url: response.url().to_string(),
        });
    }

    let declared = response.content_length().unwrap_or_default();
    if declared > MAX_JSON_BODY as u64 {
        return Err(ProviderClientError::ResponseTooLarge { size: declared });
    }

    let body = response.bytes().await?;
    if body.len() > MAX_JSON_BODY {
        return Err(ProviderClientError::ResponseTooLarge {
            size: body.len() as u64,
        });
    }

    Ok(serde_json::from_slice(&body)?)
}
