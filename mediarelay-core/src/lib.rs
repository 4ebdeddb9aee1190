pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;

pub use cache::{cache_key, RedirectCache};
pub use config::Config;
pub use error::{Error, Result};
