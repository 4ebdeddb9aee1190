// mediarelay provider clients
//
// Pure HTTP clients for the two upstreams the relay talks to.
// They know nothing about request routing or caching and can be used standalone.
//
// Architecture:
// - emby: media-library API (item and sync job-item lookups)
// - alist: storage backend (URL signing, redirect hop, fs/get)

// Shared error types
pub mod error;

pub mod alist;
pub mod emby;

pub use alist::AlistClient;
pub use alist::error::AlistError;
pub use emby::EmbyClient;
pub use emby::error::EmbyError;
pub use error::ProviderClientError;
