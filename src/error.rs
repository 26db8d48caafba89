use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised anywhere between loading an image and reporting features.
///
/// Nothing in the crate retries: every variant aborts the current run and
/// unwinds to the caller.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("image could not be loaded: {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("the image could not be converted to grayscale: image is empty")]
    Conversion,

    #[error("image is empty, operation cannot be applied")]
    EmptyImage,

    #[error("grayscale image is missing, convert the image before detecting features")]
    MissingGrayscale,

    #[error("scale factor must be greater than 0, got {0}")]
    InvalidScale(f64),

    #[error("scale factor {factor} is too large for a {width}x{height} image")]
    ScaleTooLarge { factor: f64, width: u32, height: u32 },

    #[error("quality level must be within [0, 100], got {0}")]
    InvalidQuality(i32),

    #[error("threshold must be within [0, {max}], got {value}")]
    InvalidThreshold { value: i32, max: i32 },

    #[error("could not open file for writing: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read feature file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed feature line {line}: {content:?}")]
    Parse { line: usize, content: String },

    #[error("display failed: {0}")]
    Display(String),

    #[error("event source failed: {0}")]
    Event(String),
}

pub type Result<T> = std::result::Result<T, DetectError>;
