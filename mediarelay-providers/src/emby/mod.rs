//! Emby/Jellyfin Provider Client
//!
//! HTTP client for the media-library API. Only the lookups needed to find
//! where an item's file lives are implemented.

mod client;
pub mod error;
pub mod types;

pub use client::EmbyClient;
pub use error::EmbyError;
pub use types::*;
