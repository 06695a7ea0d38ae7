//! Selection engine.
//!
//! Given a set of folders, [`Picker::select`] decides what to read next:
//!
//! 1. **Sequential**: the folders and their visible subfolders are analyzed in
//!    random order, and the first numbered collection found with an unread
//!    file supplies the pick.
//! 2. **Random**: otherwise one file is drawn from every file below the
//!    folders, read from the directory cache when it is still valid. If that
//!    file's folder holds an unfinished collection, the pick moves to its
//!    first unread file, preferring the collection the file belongs to.
//!
//! A pick that continues a collection is recorded in the tracker; a purely
//! random pick is not. When the result is a ZIP archive, one member is
//! extracted into a temporary directory that the caller is responsible for
//! removing (see [`Picked::cleanup`]).
//!
//! Finding nothing is not an error: it is [`Selection::NotFound`].

pub mod error;
mod models;
mod picker;
mod scan;

pub use crate::models::{Method, NotFound, Picked, Request, Selection, SelectionInfo, SequenceInfo};
pub use crate::picker::{Picker, Redirect};
