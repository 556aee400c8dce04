use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No {0} font found on this system")]
    FontUnavailable(&'static str),
    #[error("Failed to read font {}: {source}", .path.display())]
    FontLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported font data")]
    InvalidFont,
    #[error("Cannot draw on a {width}x{height} canvas")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Malformed image data URL")]
    MalformedDataUrl,
    #[error("Export directory not found: {}", .0.display())]
    ExportDirNotFound(PathBuf),
    #[error("Failed to write export {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why an export request was not accepted.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExportRejected {
    #[error("An image is already being generated")]
    InFlight,
}
