use thiserror::Error;

use crate::error::ProviderClientError;

#[derive(Debug, Error)]
pub enum EmbyError {
    #[error("Emby request failed: {0}")]
    Upstream(#[from] ProviderClientError),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for EmbyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.into())
    }
}
