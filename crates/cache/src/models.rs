use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::PathBuf;
use std::time::SystemTime;
use time::OffsetDateTime;

/// Nanoseconds since the Unix epoch, saturating outside the `i64` range.
pub(crate) fn unix_nanos(time: SystemTime) -> i64 {
    let nanos = OffsetDateTime::from(time).unix_timestamp_nanos();
    i64::try_from(nanos).unwrap_or(if nanos < 0 { i64::MIN } else { i64::MAX })
}

/// One file found while walking a searched folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub name: String,
    pub size: Option<u64>,
    /// Modification time in nanoseconds since the Unix epoch.
    pub modified: Option<i64>,
}
impl FileRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        Self { path, name, size: None, modified: None }
    }

    pub fn with_metadata(mut self, metadata: &Metadata) -> Self {
        self.size = Some(metadata.len());
        self.modified = metadata.modified().ok().map(unix_nanos);
        self
    }
}

/// Search settings that change which files a walk finds. Keywords are not
/// part of it: they are applied on top of the cached listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Prefix (or comma-separated prefixes) of file names to skip.
    pub read_prefix: String,
    /// Prefix of folder names to skip.
    pub ignore_prefix: String,
    pub process_zip: bool,
}
impl SearchParams {
    pub fn config_hash(&self) -> String {
        let key = format!("{}|{}|{}", self.read_prefix, self.ignore_prefix, self.process_zip);
        blake3::hash(key.as_bytes()).to_hex().to_string()
    }
}

/// Everything cached about one searched folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub folder_path: PathBuf,
    pub config_hash: String,
    /// The folder's own modification time when it was walked, in nanoseconds.
    pub folder_mtime: i64,
    /// Unix timestamp (seconds) of when the entry was written.
    pub created_at: i64,
    pub files: Vec<FileRecord>,
}

/// Summary of what the cache directory currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub directory: PathBuf,
    pub folder_count: usize,
    pub file_count: usize,
    /// Total size of the cache files on disk.
    pub size_bytes: u64,
    pub has_index: bool,
    pub indexed_tokens: usize,
    pub folders: Vec<FolderInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderInfo {
    pub folder: PathBuf,
    pub files: usize,
    /// RFC 3339 timestamp of when the folder was cached.
    pub created_at: String,
}
