use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid file extension: {0}")]
    InvalidExtension(String),

    #[error("Invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    #[error("Region {region} lies outside the {width}x{height} buffer")]
    RegionOutOfBounds {
        region: crate::Rect,
        width: u32,
        height: u32,
    },

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Malformed data URI: {0}")]
    DataUri(String),

    #[error(
        "Failed to load image from '{url}': {reason}. \
         Check that the backend serving the image is running and that it allows cross-origin requests."
    )]
    Unreachable { url: String, reason: String },
}

impl From<image_lib::ImageError> for Error {
    fn from(e: image_lib::ImageError) -> Self {
        Error::Decoding(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
