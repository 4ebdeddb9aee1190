// mediarelay API Library
//
// Single catch-all HTTP surface in front of the media library server

pub mod http;

// Re-export commonly used types
pub use http::{create_router, AppState};
