use super::Scheme;
use std::path::{Path, PathBuf};

/// A single numbered file discovered during analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name, including extension.
    pub filename: String,
    /// Ordering value.
    pub number: f64,
    /// Scheme the ordering value was parsed under.
    pub scheme: Scheme,
    /// Name of the collection with the numbering stripped.
    pub collection_name: String,
}

/// Two or more files in one folder that share a collection name and a
/// dominant numbering scheme, sorted ascending by their ordering value.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub folder: PathBuf,
    pub collection_name: String,
    pub scheme: Scheme,
    pub(crate) files: Vec<FileEntry>,
}
impl Collection {
    /// Files in ascending order.
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Number of files in the collection. Always at least 2.
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the given path is one of this collection's files.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.files.iter().any(|entry| entry.path == path)
    }
}
