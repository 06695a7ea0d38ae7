use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use pickr_cache::SearchParams;
use pickr_sequence::{Filter, Scheme};
use serde::Serialize;
use std::fmt::{self, Formatter};
use std::fs;
use std::path::PathBuf;

/// What to pick from, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub folders: Vec<PathBuf>,
    /// Prefix (or comma-separated prefixes) of file names to skip.
    pub exclude_prefix: String,
    /// Folders whose name starts with this are never searched.
    pub ignore_folder_prefix: String,
    pub keywords: Vec<String>,
    pub keywords_match_all: bool,
    pub ignored_extensions: Vec<String>,
    pub use_sequence: bool,
    pub process_zip: bool,
    pub use_cache: bool,
}
impl Default for Request {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            exclude_prefix: "_L_".to_string(),
            ignore_folder_prefix: ".".to_string(),
            keywords: Vec::new(),
            keywords_match_all: false,
            ignored_extensions: Vec::new(),
            use_sequence: true,
            process_zip: true,
            use_cache: true,
        }
    }
}
impl Request {
    pub fn new<I, P>(folders: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            folders: folders.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The name filter shared by the analyzer, the walk and archive members.
    pub fn filter(&self) -> Filter {
        Filter::new()
            .with_exclude_prefix(&self.exclude_prefix)
            .with_keywords(&self.keywords, self.keywords_match_all)
            .with_ignored_extensions(&self.ignored_extensions)
    }

    pub(crate) fn search_params(&self) -> SearchParams {
        SearchParams {
            read_prefix: self.exclude_prefix.clone(),
            ignore_prefix: self.ignore_folder_prefix.clone(),
            process_zip: self.process_zip,
        }
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[display("random")]
    Random,
    #[display("sequential")]
    Sequential,
}

/// Where a sequential pick sits in its collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceInfo {
    #[serde(rename = "type")]
    pub scheme: Scheme,
    pub collection: String,
    pub total_files: usize,
    pub file_number: f64,
}

/// How a file was chosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionInfo {
    pub method: Method,
    pub sequence_detected: bool,
    /// Folder the file was picked from.
    pub folder: Option<PathBuf>,
    pub sequence_info: Option<SequenceInfo>,
    /// Candidates for a random pick; zero when a sequence was continued
    /// without looking at anything else.
    pub total_files_found: usize,
    /// Entries that could not be read along the way.
    pub skipped: usize,
}

/// The file to open.
///
/// When it was pulled out of a ZIP archive it lives in `temp_dir`, which is
/// left on disk for the caller to open. [`Picked::cleanup`] removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Picked {
    pub file_path: PathBuf,
    pub is_from_zip: bool,
    pub zip_path: Option<PathBuf>,
    pub file_in_zip: Option<String>,
    pub temp_dir: Option<PathBuf>,
}
impl Picked {
    pub(crate) fn file(path: PathBuf) -> Self {
        Self {
            file_path: path,
            is_from_zip: false,
            zip_path: None,
            file_in_zip: None,
            temp_dir: None,
        }
    }

    /// Remove the extraction directory, if there is one. Calling it again
    /// does nothing.
    pub fn cleanup(&mut self) -> Result<()> {
        if let Some(dir) = self.temp_dir.take() {
            fs::remove_dir_all(&dir).or_raise(|| ErrorKind::Cleanup(dir.clone()))?;
            tracing::debug!(path = %dir.display(), "removed extraction directory");
        }
        Ok(())
    }
}

/// Nothing matched. Carries enough of the request to explain why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub folders: Vec<PathBuf>,
    pub keywords: Vec<String>,
    pub keywords_match_all: bool,
}
impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "no file found in {} folder(s)", self.folders.len())?;
        if !self.keywords.is_empty() {
            let joiner = if self.keywords_match_all { " AND " } else { " OR " };
            write!(f, " matching {}", self.keywords.join(joiner))?;
        }
        writeln!(f)?;
        writeln!(f, "  - check that the folders exist and are readable")?;
        write!(f, "  - loosen the keyword, prefix or extension filters")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Found { picked: Picked, info: SelectionInfo },
    NotFound(NotFound),
}
impl Selection {
    pub fn picked(&self) -> Option<&Picked> {
        match self {
            Selection::Found { picked, .. } => Some(picked),
            Selection::NotFound(_) => None,
        }
    }

    pub fn info(&self) -> Option<&SelectionInfo> {
        match self {
            Selection::Found { info, .. } => Some(info),
            Selection::NotFound(_) => None,
        }
    }
}
