//! Sequence Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Classification itself never fails (a filename without a
//! number is a normal outcome), so the only errors here come from reading the
//! folder being analyzed.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A sequence analysis error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sequence operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The folder could not be listed (missing, not a directory, or no permission).
    #[display("folder unavailable: {}", _0.display())]
    FolderUnavailable(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Cloud-synced folders occasionally fail to list while they are being
        // hydrated; asking again later is reasonable.
        matches!(self, Self::FolderUnavailable(_))
    }
}
