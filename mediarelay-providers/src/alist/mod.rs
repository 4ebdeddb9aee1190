//! Alist Provider Client
//!
//! HTTP client for the storage backend plus the URL signer its `/d` download
//! route verifies.
//!
//! # Example
//!
//! ```no_run
//! use mediarelay_providers::alist::{AlistClient, SignedUrlToken, download_path};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AlistClient::with_token("http://alist:5244", "token")?;
//! let token = SignedUrlToken::sign("token", "/movies/video.mp4", 0)?;
//! let url = format!("{}{}", client.host(), download_path("/movies/video.mp4", &token));
//! let location = client.redirect_location(&url, &Default::default()).await?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod error;
pub mod sign;
pub mod types;

pub use client::AlistClient;
pub use error::AlistError;
pub use sign::{download_path, SignedUrlToken};
pub use types::*;
