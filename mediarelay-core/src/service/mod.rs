pub mod classifier;
pub mod metadata;
pub mod playback;
pub mod redirect;
pub mod rewriter;

pub use classifier::{classify, Disposition};
pub use metadata::MetadataResolver;
pub use playback::{PlaybackService, StreamResolution};
pub use redirect::RedirectResolver;
pub use rewriter::{PlaybackInfoRewriter, RewriteError};
