//! Container detection and ZIP member access.
//!
//! A picked file may be a container rather than something to open directly.
//! [`ArchiveKind::sniff`] looks at the first bytes to decide what it is; ZIP
//! archives can then be listed with [`list_entries`] and a single member
//! pulled out with [`extract_entry`].

pub mod error;
mod kind;
mod members;

pub use crate::kind::{ArchiveKind, VideoFormat};
pub use crate::members::{extract_entry, list_entries};
