//! Archive Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file could not be opened or read.
    #[display("could not read archive: {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
    /// The file is not a valid archive. Don't retry with the same input.
    #[display("invalid or corrupted archive: {}", _0.display())]
    InvalidData(#[error(not(source))] PathBuf),
    /// The archive has no member with this name.
    #[display("no such entry in archive: {_0}")]
    MissingEntry(#[error(not(source))] String),
    /// The member's name would place it outside the extraction directory.
    #[display("unsafe entry name: {_0}")]
    UnsafeEntry(#[error(not(source))] String),
    /// Writing the extracted member failed.
    #[display("could not extract to {}", _0.display())]
    Extract(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreadable(_) | Self::Extract(_))
    }
}
