//! Selection Error Types
//!
//! Most failures during a selection are recovered from: unavailable folders
//! are skipped, a broken cache is rebuilt and an archive that cannot be
//! expanded is returned as-is. What remains is state that could not be
//! written back.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A selection error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for selection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The picked file could not be recorded as read.
    #[display("could not record {} as read", _0.display())]
    MarkRead(#[error(not(source))] PathBuf),
    /// A temporary extraction directory could not be removed.
    #[display("could not remove temporary directory {}", _0.display())]
    Cleanup(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MarkRead(_) | Self::Cleanup(_))
    }
}
