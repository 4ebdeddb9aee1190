use mediarelay_providers::{AlistError, EmbyError};
use thiserror::Error;

/// Redirect pipeline failure. Every variant sends the request to passthrough.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Media library error: {0}")]
    Library(#[from] EmbyError),

    #[error("Storage backend error: {0}")]
    Storage(#[from] AlistError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Path {path} is not under mount path {mount_path}")]
    IneligiblePath { path: String, mount_path: String },
}

pub type Result<T> = std::result::Result<T, Error>;
