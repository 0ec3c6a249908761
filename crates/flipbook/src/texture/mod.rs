//! Texture loading, caching and prefetch for page faces

mod cache;
mod key;
mod pipeline;
mod source;

use std::path::PathBuf;

use thiserror::Error;

pub use cache::{CachedTexture, TextureCache};
pub use key::{TextureKey, TextureTier, bucket_width};
pub use pipeline::{BoundTexture, SlotGroup, TexturePipeline, TextureSlot};
pub use source::{DirectoryPageSource, PagePayload, PageRequest, PageSource};

#[cfg(test)]
pub(crate) use source::testing;

/// Errors raised while fetching or decoding a page image.
///
/// These never leave the pipeline; they are logged and the affected face
/// keeps whatever texture it had.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Failed to read page image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode page image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Page source error: {0}")]
    Source(String),

    #[error("Decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("No page images found in {}", .0.display())]
    EmptyDirectory(PathBuf),
}
