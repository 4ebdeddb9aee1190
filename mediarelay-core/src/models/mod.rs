pub mod media;

pub use media::{LookupKind, MediaItemReference, MediaSourceRecord};
