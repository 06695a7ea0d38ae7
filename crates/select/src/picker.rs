use crate::error::{ErrorKind, Result};
use crate::models::{Method, NotFound, Picked, Request, Selection, SelectionInfo, SequenceInfo};
use crate::scan;
use exn::ResultExt;
use pickr_archive::{ArchiveKind, extract_entry, list_entries};
use pickr_cache::DirectoryCache;
use pickr_sequence::{Collection, FileEntry, Filter, analyze, first_unread, next_unread};
use pickr_tracker::Tracker;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

const EXTRACT_PREFIX: &str = "pickr_";

/// A file that continues a numbered collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub path: PathBuf,
    pub sequence: SequenceInfo,
}
impl Redirect {
    fn new(collection: &Collection, entry: &FileEntry) -> Self {
        Self {
            path: entry.path.clone(),
            sequence: SequenceInfo {
                scheme: collection.scheme,
                collection: collection.collection_name.clone(),
                total_files: collection.count(),
                file_number: entry.number,
            },
        }
    }
}

fn canonical_roots(folders: &[PathBuf]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for folder in folders {
        match fs::canonicalize(folder) {
            Ok(root) if root.is_dir() => {
                if !roots.contains(&root) {
                    roots.push(root);
                }
            },
            Ok(_) => tracing::warn!(path = %folder.display(), "not a directory, skipping it"),
            Err(err) => tracing::warn!(path = %folder.display(), error = %err, "folder unavailable, skipping it"),
        }
    }
    roots
}

fn has_zip_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

fn not_found(request: &Request) -> Selection {
    Selection::NotFound(NotFound {
        folders: request.folders.clone(),
        keywords: request.keywords.clone(),
        keywords_match_all: request.keywords_match_all,
    })
}

/// Picks the next file to read.
///
/// Owns the read history, the optional directory cache and the random source
/// used for every choice it makes.
#[derive(Debug)]
pub struct Picker<R = StdRng> {
    tracker: Tracker,
    cache: Option<DirectoryCache>,
    rng: R,
}
impl Picker<StdRng> {
    pub fn new(tracker: Tracker, cache: Option<DirectoryCache>) -> Self {
        Self::with_rng(tracker, cache, StdRng::from_entropy())
    }
}
impl<R: Rng> Picker<R> {
    /// Use a specific random source, typically a seeded one.
    pub fn with_rng(tracker: Tracker, cache: Option<DirectoryCache>, rng: R) -> Self {
        Self { tracker, cache, rng }
    }

    pub fn tracker(&mut self) -> &mut Tracker {
        &mut self.tracker
    }

    pub fn cache(&mut self) -> Option<&mut DirectoryCache> {
        self.cache.as_mut()
    }

    /// Pick a file.
    ///
    /// In sequential mode the folders are searched (in random order) for a
    /// numbered collection with something left to read. Otherwise, or when
    /// every collection is finished, a file is picked at random; if that
    /// file's folder has a collection that is not finished, the pick is moved
    /// onto it (see [`Picker::redirect`]).
    ///
    /// Whatever is returned from a collection is recorded as read. A ZIP
    /// archive is swapped for one of its members when `process_zip` is set.
    #[instrument(skip_all, fields(folders = request.folders.len(), sequential = request.use_sequence))]
    pub fn select(&mut self, request: &Request) -> Result<Selection> {
        let filter = request.filter();
        let roots = canonical_roots(&request.folders);
        if roots.is_empty() {
            return Ok(not_found(request));
        }
        let mut skipped = 0;

        if request.use_sequence {
            let (folders, unreadable) = scan::folders(&roots, &request.ignore_folder_prefix);
            skipped += unreadable;
            if let Some(next) = self.continue_sequence(folders, &filter)? {
                let info = SelectionInfo {
                    method: Method::Sequential,
                    sequence_detected: true,
                    folder: next.path.parent().map(Path::to_path_buf),
                    sequence_info: Some(next.sequence),
                    total_files_found: 0,
                    skipped,
                };
                let picked = self.finalize(next.path, request, &filter);
                return Ok(Selection::Found { picked, info });
            }
            tracing::debug!("no unread sequence, falling back to a random pick");
        }

        let candidates = self.candidates(&roots, request, &filter, &mut skipped);
        let Some(pick) = candidates.choose(&mut self.rng).cloned() else {
            tracing::info!(skipped, "nothing matched");
            return Ok(not_found(request));
        };
        tracing::debug!(path = %pick.display(), candidates = candidates.len(), "picked at random");

        let (path, method, sequence) = match self.redirect(&pick, &filter)? {
            Some(redirect) => (redirect.path, Method::Sequential, Some(redirect.sequence)),
            None => (pick, Method::Random, None),
        };
        let info = SelectionInfo {
            method,
            sequence_detected: sequence.is_some(),
            folder: path.parent().map(Path::to_path_buf),
            sequence_info: sequence,
            total_files_found: candidates.len(),
            skipped,
        };
        let picked = self.finalize(path, request, &filter);
        Ok(Selection::Found { picked, info })
    }

    /// Move a random pick onto an unread file of a collection in its folder.
    ///
    /// The pick's own collection is preferred; when the pick is not part of
    /// one, or its collection has been read to the end, any other unfinished
    /// collection in the same folder is continued instead. Returns `None`
    /// when the folder has nothing left to continue. A redirect is recorded
    /// as read.
    #[instrument(skip_all, fields(path = %picked.display()))]
    pub fn redirect(&mut self, picked: &Path, filter: &Filter) -> Result<Option<Redirect>> {
        let Some(folder) = picked.parent() else {
            return Ok(None);
        };
        let collections = match analyze(folder, filter) {
            Ok(Some(collections)) => collections,
            Ok(None) => return Ok(None),
            Err(err) => {
                tracing::warn!(error = ?err, "could not analyze folder of the picked file");
                return Ok(None);
            },
        };
        let own = collections
            .iter()
            .find(|collection| collection.contains(picked))
            .and_then(|collection| first_unread(collection, &mut self.tracker, filter).map(|entry| (collection, entry)));
        let redirect = match own {
            Some((collection, entry)) => Redirect::new(collection, entry),
            None => match next_unread(&collections, &mut self.tracker, filter, &mut self.rng) {
                Some(next) => Redirect::new(next.collection, next.entry),
                None => {
                    tracing::debug!("every collection in the folder is read");
                    return Ok(None);
                },
            },
        };
        self.mark_read(&redirect.path)?;
        tracing::info!(to = %redirect.path.display(), "continuing collection of random pick");
        Ok(Some(redirect))
    }

    fn continue_sequence(&mut self, mut folders: Vec<PathBuf>, filter: &Filter) -> Result<Option<Redirect>> {
        folders.shuffle(&mut self.rng);
        for folder in &folders {
            let collections = match analyze(folder, filter) {
                Ok(Some(collections)) => collections,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(folder = %folder.display(), error = ?err, "skipping folder");
                    continue;
                },
            };
            let Some(next) = next_unread(&collections, &mut self.tracker, filter, &mut self.rng) else {
                continue;
            };
            let redirect = Redirect::new(next.collection, next.entry);
            self.mark_read(&redirect.path)?;
            tracing::info!(
                path = %redirect.path.display(),
                collection = %redirect.sequence.collection,
                number = redirect.sequence.file_number,
                "continuing sequence",
            );
            return Ok(Some(redirect));
        }
        Ok(None)
    }

    /// Files eligible for a random pick, from the cache when it is usable and
    /// from a fresh walk otherwise.
    fn candidates(&mut self, roots: &[PathBuf], request: &Request, filter: &Filter, skipped: &mut usize) -> Vec<PathBuf> {
        let params = request.search_params();
        if request.use_cache
            && let Some(cache) = self.cache.as_mut()
            && cache.is_valid(roots, &params)
        {
            let cached = cache.get_cached_files_in(roots, filter.keywords(), filter.match_all());
            tracing::debug!(files = cached.len(), "using cached listing");
            return cached
                .into_iter()
                .filter(|path| {
                    let name = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
                    !filter.is_excluded(&name) && !filter.is_ignored_extension(&name)
                })
                .collect();
        }

        let walk = scan::files(roots, filter, &request.ignore_folder_prefix);
        *skipped += walk.skipped;
        if request.use_cache
            && let Some(cache) = self.cache.as_mut()
            && let Err(err) = cache.save(&walk.files, roots, &params)
        {
            tracing::warn!(error = ?err, "could not save directory cache");
        }
        walk.files
            .into_iter()
            .filter(|file| filter.accepts(&file.name))
            .map(|file| file.path)
            .collect()
    }

    fn mark_read(&mut self, path: &Path) -> Result<()> {
        self.tracker
            .mark_as_read(path)
            .or_raise(|| ErrorKind::MarkRead(path.to_path_buf()))
    }

    /// Swap a ZIP archive for one of its members. Anything else, and any
    /// archive that cannot be expanded, is returned as it is.
    fn finalize(&mut self, path: PathBuf, request: &Request, filter: &Filter) -> Picked {
        if !request.process_zip || !has_zip_extension(&path) {
            return Picked::file(path);
        }
        match ArchiveKind::sniff(&path) {
            Ok(ArchiveKind::Zip) => self.expand_zip(path, filter),
            Ok(kind @ (ArchiveKind::Rar | ArchiveKind::Pdf | ArchiveKind::Video(_) | ArchiveKind::Unsupported)) => {
                tracing::debug!(path = %path.display(), %kind, "not a zip archive, returning it as-is");
                Picked::file(path)
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), error = ?err, "could not inspect archive");
                Picked::file(path)
            },
        }
    }

    #[instrument(skip_all, fields(archive = %archive.display()))]
    fn expand_zip(&mut self, archive: PathBuf, filter: &Filter) -> Picked {
        let entries = match list_entries(&archive, filter) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = ?err, "could not list archive members");
                return Picked::file(archive);
            },
        };
        let Some(entry) = entries.choose(&mut self.rng).cloned() else {
            tracing::debug!("no archive member matches");
            return Picked::file(archive);
        };
        let temp = match tempfile::Builder::new().prefix(EXTRACT_PREFIX).tempdir() {
            Ok(temp) => temp,
            Err(err) => {
                tracing::warn!(error = %err, "could not create extraction directory");
                return Picked::file(archive);
            },
        };
        match extract_entry(&archive, &entry, temp.path()) {
            Ok(extracted) => Picked {
                file_path: extracted,
                is_from_zip: true,
                zip_path: Some(archive),
                file_in_zip: Some(entry),
                temp_dir: Some(temp.keep()),
            },
            // Dropping `temp` removes whatever was partially written.
            Err(err) => {
                tracing::warn!(entry = %entry, error = ?err, "extraction failed, returning the archive");
                Picked::file(archive)
            },
        }
    }
}
