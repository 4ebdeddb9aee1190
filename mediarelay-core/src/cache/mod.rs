pub mod key_builder;
pub mod redirect_cache;

pub use key_builder::cache_key;
pub use redirect_cache::RedirectCache;
