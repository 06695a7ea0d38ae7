//! Tracker Error Types
//!
//! Reading the state never fails: a missing or corrupt file is an empty
//! history. Only writing it back can go wrong.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A tracker error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The state file (or its directory) could not be written.
    #[display("could not save read state to {}", _0.display())]
    Save(#[error(not(source))] PathBuf),
    /// The state could not be serialized.
    #[display("could not encode read state")]
    Encode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Save(_))
    }
}
