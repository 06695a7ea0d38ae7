//! Cache Error Types
//!
//! Only writes surface as errors. Unreadable or corrupt cache data is a miss,
//! logged and then ignored.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The cache directory could not be created or listed.
    #[display("cache directory unavailable: {}", _0.display())]
    Unavailable(#[error(not(source))] PathBuf),
    /// A cache file could not be written or removed.
    #[display("could not write cache file: {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    /// Cache data could not be serialized.
    #[display("could not encode cache data")]
    Encode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Write(_))
    }
}
