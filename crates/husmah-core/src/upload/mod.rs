//! Project image handling.
//!
//! - `image`: local image files, type/size validation and `data:` URLs
//! - `uploader`: upload to the image host with preset fallback
//!
//! All failures are reported as `UploadError`, whose messages are shown to
//! the user verbatim.

pub mod image;
pub mod uploader;

use thiserror::Error;

pub use image::{ImageFile, MAX_IMAGE_BYTES};
pub use uploader::{ImageUploader, UPLOAD_HOST};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File type {0} is not supported. Please use JPEG, PNG, GIF, or WebP.")]
    UnsupportedType(String),

    #[error("File size {size_mb:.2}MB exceeds the 10MB limit.")]
    TooLarge { size_mb: f64 },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to connect to image upload service. Please check your internet connection.")]
    Unreachable,

    #[error("Upload failed: {status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("Upload failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upload failed: unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Image upload failed: {0}")]
    Image(Box<UploadError>),

    #[error("Main image upload failed: {0}")]
    MainImage(Box<UploadError>),

    #[error("Additional images upload failed: {0}")]
    AdditionalImages(Box<UploadError>),
}

impl UploadError {
    /// Whether the host refused the request because of the upload preset
    pub fn is_preset_error(&self) -> bool {
        match self {
            UploadError::Rejected { body, .. } => {
                body.contains("Upload preset not found") || body.contains("Invalid upload preset")
            }
            _ => false,
        }
    }
}
