//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, image codec, archive and watcher errors, and provides
//! semantic variants for upload validation, model failures and argument checks.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("File {name} is too large ({size} bytes, max {limit} bytes)")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("Too many files: {count} uploaded, maximum is {max}")]
    TooManyFiles { count: usize, max: usize },

    #[error("Background removal failed: {0}")]
    Model(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Size must be greater than 0, got: {size}")]
    ZeroSize { size: u32 },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }

    pub fn model<E: std::fmt::Display>(e: E) -> Self {
        Error::Model(e.to_string())
    }

    /// True for errors caused by what the caller sent rather than by this process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFormat(_)
                | Error::FileTooLarge { .. }
                | Error::TooManyFiles { .. }
                | Error::InvalidArgument { .. }
                | Error::MissingArgument { .. }
        )
    }
}
