use std::path::Path;

use async_trait::async_trait;

use crate::models::ImageAsset;

pub mod cloudinary;

pub use cloudinary::{CloudinaryClient, CloudinaryConfig};

/// Folder event images are stored under on the media host.
pub const EVENT_IMAGE_FOLDER: &str = "event/images";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Failed to read staged file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media host request failed: {0}")]
    Transport(String),

    #[error("Media host rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected media host response: {0}")]
    InvalidResponse(String),
}

/// Remote image store. Each call is attempted once; retry policy, if any,
/// lives in the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Uploads the file at `file` into `folder` and returns its reference.
    async fn upload(&self, file: &Path, folder: &str) -> Result<ImageAsset, MediaError>;

    /// Removes a previously uploaded asset.
    async fn delete(&self, image_id: &str) -> Result<(), MediaError>;
}
