//! Recursive folder walks.

use pickr_cache::FileRecord;
use pickr_sequence::Filter;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Files found under a set of roots.
#[derive(Debug, Default)]
pub(crate) struct Walk {
    pub files: Vec<FileRecord>,
    /// Entries that could not be read.
    pub skipped: usize,
}

fn is_hidden(entry: &DirEntry, ignore_prefix: &str) -> bool {
    !ignore_prefix.is_empty()
        && entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with(ignore_prefix)
}

fn walker<'a>(root: &Path, ignore_prefix: &'a str) -> impl Iterator<Item = walkdir::Result<DirEntry>> + 'a {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(move |entry| !is_hidden(entry, ignore_prefix))
}

/// Every file below `roots`, skipping hidden folders and names the filter
/// excludes by prefix. Extension and keyword rules are left to the caller so
/// the listing can be cached independently of them.
pub(crate) fn files(roots: &[PathBuf], filter: &Filter, ignore_prefix: &str) -> Walk {
    let mut walk = Walk::default();
    for root in roots {
        for entry in walker(root, ignore_prefix) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    walk.skipped += 1;
                    continue;
                },
            };
            if !entry.file_type().is_file() || filter.is_excluded(&entry.file_name().to_string_lossy()) {
                continue;
            }
            let record = FileRecord::new(entry.path());
            let record = match entry.metadata() {
                Ok(metadata) => record.with_metadata(&metadata),
                Err(err) => {
                    tracing::debug!(path = %entry.path().display(), error = %err, "no metadata for file");
                    record
                },
            };
            walk.files.push(record);
        }
    }
    walk
}

/// The roots themselves followed by every visible folder beneath them.
pub(crate) fn folders(roots: &[PathBuf], ignore_prefix: &str) -> (Vec<PathBuf>, usize) {
    let mut folders: Vec<PathBuf> = Vec::new();
    let mut skipped = 0;
    for root in roots {
        for entry in walker(root, ignore_prefix) {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    if !folders.iter().any(|folder| folder == entry.path()) {
                        folders.push(entry.into_path());
                    }
                },
                Ok(_) => {},
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    skipped += 1;
                },
            }
        }
    }
    (folders, skipped)
}
