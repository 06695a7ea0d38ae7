//! Sequence detection for folders of numbered files.
//!
//! Comic issues, ebook volumes and episode files almost always carry an
//! ordering number somewhere in their name. This crate recognizes those
//! numbers and groups a folder's files into [`Collection`]s so a caller can
//! continue a series instead of picking at random.
//!
//! # Schemes
//! A filename is tried against each [`Scheme`] in priority order and the first
//! match wins:
//!
//! | Scheme         | Example               |
//! |----------------|-----------------------|
//! | `decimal`      | `001 - Title.cbz`     |
//! | `hash_decimal` | `Batman #12.cbz`      |
//! | `x_of_y`       | `Saga 01 de 10.pdf`   |
//! | `chapter`      | `Story Chapter 3.txt` |
//! | `volume`       | `A Floresta Vol 2.epub` |
//! | `part`         | `Parte 2.txt`         |
//! | `episode`      | `Show Ep 05.mkv`      |
//! | `roman`        | `Rocky IV.mkv`        |
//! | `fallback`     | any digits at all     |
//!
//! The fallback is deliberately loose and will happily read a year in a title
//! as the ordering number.

mod analyze;
mod classify;
mod consts;
pub mod error;
mod filter;
pub mod models;
mod next;

pub use crate::analyze::analyze;
pub use crate::classify::{classify, extract_number, roman_to_decimal, strip_number};
pub use crate::filter::{Filter, matches_keywords};
pub use crate::models::{Collection, FileEntry, FileNumber, Scheme};
pub use crate::next::{NextUnread, ReadLog, first_unread, next_unread};
