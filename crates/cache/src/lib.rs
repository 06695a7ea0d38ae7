//! Directory listing cache.
//!
//! Walking a large library on every pick is slow, so the files found under
//! each searched folder are cached on disk, one file per folder, alongside a
//! single keyword index over every cached file name.
//!
//! # Validity
//! An entry is reused only while both of these hold:
//! - the search settings that shaped the walk ([`SearchParams`]) hash the same,
//! - the folder's own modification time has not moved past the one recorded.
//!
//! Only the searched folder itself is checked. A change deep inside a
//! subfolder that leaves the folder's own mtime alone goes unnoticed until
//! the cache is cleared.
//!
//! # Layout
//! ```text
//! <cache dir>/
//!   folder_<16 hex chars>.json.gz   one per searched folder
//!   keyword_index.json.gz           token -> paths
//! ```
//! Files are gzip-compressed JSON, replaced atomically. Nothing is locked:
//! concurrent writers race and the last one wins.

pub mod error;
mod index;
mod models;
mod store;

use crate::error::{ErrorKind, Result};
use crate::index::is_indexable;
pub use crate::index::KeywordIndex;
pub use crate::models::{CacheEntry, CacheInfo, FileRecord, FolderInfo, SearchParams};
use exn::ResultExt;
use pickr_sequence::matches_keywords;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcDateTime};
use tracing::instrument;

const ENTRY_PREFIX: &str = "folder_";
const ENTRY_SUFFIX: &str = ".json.gz";
const INDEX_FILE: &str = "keyword_index.json.gz";

/// Stable key for a folder: the first 16 hex characters of the BLAKE3 hash
/// of its resolved path.
pub fn folder_key(folder: &Path) -> String {
    let resolved = folder.canonicalize().unwrap_or_else(|_| folder.to_path_buf());
    let mut key = blake3::hash(resolved.to_string_lossy().as_bytes()).to_hex().to_string();
    key.truncate(16);
    key
}

fn folder_mtime(folder: &Path) -> Option<i64> {
    let metadata = fs::metadata(folder).ok()?;
    if !metadata.is_dir() {
        return None;
    }
    metadata.modified().ok().map(models::unix_nanos)
}

#[derive(Debug, Default)]
struct Loaded {
    entries: BTreeMap<PathBuf, CacheEntry>,
    index: Option<KeywordIndex>,
}
impl Loaded {
    fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.entries.values().flat_map(|entry| entry.files.iter())
    }
}

/// Cache of folder listings stored in one directory.
#[derive(Debug)]
pub struct DirectoryCache {
    dir: PathBuf,
    loaded: Option<Loaded>,
}
impl DirectoryCache {
    /// Use `dir` for cache files. It is created on the first save.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), loaded: None }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, folder: &Path) -> PathBuf {
        self.dir.join(format!("{ENTRY_PREFIX}{}{ENTRY_SUFFIX}", folder_key(folder)))
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn is_cache_file(name: &str) -> bool {
        name == INDEX_FILE || (name.starts_with(ENTRY_PREFIX) && name.ends_with(ENTRY_SUFFIX))
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let Ok(listing) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = listing
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(ENTRY_PREFIX) && name.ends_with(ENTRY_SUFFIX))
            })
            .collect();
        paths.sort();
        paths
    }

    fn loaded(&mut self) -> &mut Loaded {
        if self.loaded.is_none() {
            let mut loaded = Loaded::default();
            for path in self.entry_files() {
                if let Some(entry) = store::read::<CacheEntry>(&path) {
                    loaded.entries.insert(entry.folder_path.clone(), entry);
                }
            }
            loaded.index = store::read::<KeywordIndex>(&self.index_path());
            tracing::debug!(
                dir = %self.dir.display(),
                folders = loaded.entries.len(),
                has_index = loaded.index.is_some(),
                "cache loaded"
            );
            self.loaded = Some(loaded);
        }
        self.loaded.get_or_insert_with(Loaded::default)
    }

    /// Whether every folder has an entry written under the same search
    /// settings, and none of the folders has been modified since.
    #[instrument(skip_all, fields(folders = folders.len()))]
    pub fn is_valid(&self, folders: &[PathBuf], params: &SearchParams) -> bool {
        if folders.is_empty() {
            return false;
        }
        let config_hash = params.config_hash();
        folders.iter().all(|folder| {
            let Some(entry) = store::read::<CacheEntry>(&self.entry_path(folder)) else {
                tracing::debug!(folder = %folder.display(), "no cache entry");
                return false;
            };
            if entry.config_hash != config_hash {
                tracing::debug!(folder = %folder.display(), "cache entry written with other settings");
                return false;
            }
            match folder_mtime(folder) {
                Some(mtime) if mtime <= entry.folder_mtime => true,
                _ => {
                    tracing::debug!(folder = %folder.display(), "folder changed since it was cached");
                    false
                },
            }
        })
    }

    /// Store the walk results for `folders` and rebuild the keyword index.
    ///
    /// Each file goes to the first folder that contains it. Folders without
    /// any files still get an (empty) entry.
    #[instrument(skip_all, fields(files = files.len(), folders = folders.len()))]
    pub fn save(&mut self, files: &[FileRecord], folders: &[PathBuf], params: &SearchParams) -> Result<()> {
        fs::create_dir_all(&self.dir).or_raise(|| ErrorKind::Unavailable(self.dir.clone()))?;
        let config_hash = params.config_hash();
        let created_at = UtcDateTime::now().unix_timestamp();

        let mut partitions: Vec<Vec<FileRecord>> = vec![Vec::new(); folders.len()];
        for file in files {
            if let Some(slot) = folders.iter().position(|folder| file.path.starts_with(folder)) {
                partitions[slot].push(file.clone());
            }
        }

        let mut written = Vec::with_capacity(folders.len());
        for (folder, files) in folders.iter().zip(partitions) {
            let entry = CacheEntry {
                folder_path: folder.clone(),
                config_hash: config_hash.clone(),
                folder_mtime: folder_mtime(folder).unwrap_or_default(),
                created_at,
                files,
            };
            store::write(&self.entry_path(folder), &entry)?;
            written.push(entry);
        }

        let index_path = self.index_path();
        let loaded = self.loaded();
        for entry in written {
            loaded.entries.insert(entry.folder_path.clone(), entry);
        }
        let index = KeywordIndex::build(loaded.files());
        store::write(&index_path, &index)?;
        tracing::info!(tokens = index.len(), "cache saved");
        loaded.index = Some(index);
        Ok(())
    }

    /// Paths of every cached file whose name matches the keywords: all of
    /// them when `match_all` is set, any of them otherwise.
    ///
    /// Without keywords every cached path is returned. Each path appears once,
    /// even when nested folders were cached separately. Order is unspecified.
    pub fn get_cached_files<S: AsRef<str>>(&mut self, keywords: &[S], match_all: bool) -> Vec<PathBuf> {
        self.matching(None, keywords, match_all)
    }

    /// Like [`get_cached_files`](Self::get_cached_files), but only from the
    /// entries of `folders`. Entries cached for any other folder, including
    /// one nested inside a requested folder, are ignored.
    pub fn get_cached_files_in<S: AsRef<str>>(
        &mut self,
        folders: &[PathBuf],
        keywords: &[S],
        match_all: bool,
    ) -> Vec<PathBuf> {
        self.matching(Some(folders), keywords, match_all)
    }

    fn matching<S: AsRef<str>>(&mut self, folders: Option<&[PathBuf]>, keywords: &[S], match_all: bool) -> Vec<PathBuf> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        let loaded: &Loaded = self.loaded();
        let mut seen: BTreeSet<&PathBuf> = BTreeSet::new();
        let files: Vec<&FileRecord> = loaded
            .entries
            .values()
            .filter(|entry| folders.is_none_or(|folders| folders.contains(&entry.folder_path)))
            .flat_map(|entry| entry.files.iter())
            .filter(|file| seen.insert(&file.path))
            .collect();
        if keywords.is_empty() {
            return files.iter().map(|file| file.path.clone()).collect();
        }
        let Some(index) = &loaded.index else {
            tracing::debug!("no keyword index, scanning cached names");
            return files
                .iter()
                .filter(|file| matches_keywords(&file.name, &keywords, match_all))
                .map(|file| file.path.clone())
                .collect();
        };

        let mut matched: Option<BTreeSet<&PathBuf>> = None;
        for keyword in &keywords {
            let hits: BTreeSet<&PathBuf> = if is_indexable(keyword) {
                index.lookup(keyword)
            } else {
                files
                    .iter()
                    .filter(|file| file.name.to_lowercase().contains(keyword.as_str()))
                    .map(|file| &file.path)
                    .collect()
            };
            matched = Some(match matched {
                None => hits,
                Some(acc) if match_all => acc.intersection(&hits).copied().collect(),
                Some(mut acc) => {
                    acc.extend(hits);
                    acc
                },
            });
        }
        let matched = matched.unwrap_or_default();
        files
            .iter()
            .filter(|file| matched.contains(&file.path))
            .map(|file| file.path.clone())
            .collect()
    }

    /// Delete every cache file and forget what was loaded.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn clear(&mut self) -> Result<()> {
        self.loaded = None;
        let listing = match fs::read_dir(&self.dir) {
            Ok(listing) => listing,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => Err(err).or_raise(|| ErrorKind::Unavailable(self.dir.clone()))?,
        };
        let mut removed = 0;
        for entry in listing.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            let is_cache_file = path.file_name().and_then(|name| name.to_str()).is_some_and(Self::is_cache_file);
            if is_cache_file {
                fs::remove_file(&path).or_raise(|| ErrorKind::Write(path.clone()))?;
                removed += 1;
            }
        }
        tracing::info!(removed, "cache cleared");
        Ok(())
    }

    /// What the cache currently holds.
    pub fn info(&mut self) -> CacheInfo {
        let size_bytes = self
            .entry_files()
            .into_iter()
            .chain(std::iter::once(self.index_path()))
            .filter_map(|path| fs::metadata(path).ok())
            .map(|metadata| metadata.len())
            .sum();
        let directory = self.dir.clone();
        let loaded = self.loaded();
        let folders = loaded
            .entries
            .values()
            .map(|entry| FolderInfo {
                folder: entry.folder_path.clone(),
                files: entry.files.len(),
                created_at: OffsetDateTime::from_unix_timestamp(entry.created_at)
                    .ok()
                    .and_then(|created| created.format(&Rfc3339).ok())
                    .unwrap_or_default(),
            })
            .collect();
        CacheInfo {
            directory,
            folder_count: loaded.entries.len(),
            file_count: loaded.files().count(),
            size_bytes,
            has_index: loaded.index.is_some(),
            indexed_tokens: loaded.index.as_ref().map_or(0, KeywordIndex::len),
            folders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    struct Library {
        root: TempDir,
        cache: TempDir,
    }
    impl Library {
        fn folder(&self) -> PathBuf {
            self.root.path().canonicalize().unwrap()
        }

        fn records(&self) -> Vec<FileRecord> {
            let folder = self.folder();
            let mut records: Vec<FileRecord> = fs::read_dir(&folder)
                .unwrap()
                .map(|entry| {
                    let entry = entry.unwrap();
                    FileRecord::new(entry.path()).with_metadata(&entry.metadata().unwrap())
                })
                .collect();
            records.sort_by(|a, b| a.path.cmp(&b.path));
            records
        }

        fn cache(&self) -> DirectoryCache {
            DirectoryCache::open(self.cache.path())
        }
    }

    fn params() -> SearchParams {
        SearchParams {
            read_prefix: "_L_".to_string(),
            ignore_prefix: ".".to_string(),
            process_zip: true,
        }
    }

    #[fixture]
    fn library() -> Library {
        let root = TempDir::new().unwrap();
        for name in [
            "Marvel Team-Up Episode 01.cbr",
            "Marvel Team-Up Episode 02.cbr",
            "Batman #1.cbz",
            "Superman #1.cbz",
        ] {
            File::create(root.path().join(name)).unwrap();
        }
        Library { root, cache: TempDir::new().unwrap() }
    }

    fn names(mut paths: Vec<PathBuf>) -> Vec<String> {
        paths.sort();
        paths
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[rstest]
    fn test_round_trip(library: Library) {
        let folders = vec![library.folder()];
        let mut cache = library.cache();
        assert!(!cache.is_valid(&folders, &params()));
        cache.save(&library.records(), &folders, &params()).unwrap();
        assert!(cache.is_valid(&folders, &params()));
        assert_eq!(cache.get_cached_files::<&str>(&[], false).len(), 4);

        // A fresh instance reads the same state back from disk.
        let mut reopened = library.cache();
        assert!(reopened.is_valid(&folders, &params()));
        assert_eq!(
            names(reopened.get_cached_files::<&str>(&[], false)),
            names(cache.get_cached_files::<&str>(&[], false))
        );
    }

    #[rstest]
    fn test_other_settings_invalidate(library: Library) {
        let folders = vec![library.folder()];
        let mut cache = library.cache();
        cache.save(&library.records(), &folders, &params()).unwrap();
        let other = SearchParams { process_zip: false, ..params() };
        assert!(!cache.is_valid(&folders, &other));
        assert_ne!(params().config_hash(), other.config_hash());
    }

    #[rstest]
    fn test_stale_after_folder_changes(library: Library) {
        let folders = vec![library.folder()];
        let mut cache = library.cache();
        cache.save(&library.records(), &folders, &params()).unwrap();
        assert!(cache.is_valid(&folders, &params()));

        // Filesystem timestamps can be coarse; move the folder's mtime
        // forward explicitly instead of relying on a new file to do it.
        let later = SystemTime::now() + Duration::from_secs(60);
        File::open(library.folder()).unwrap().set_modified(later).unwrap();
        assert!(!cache.is_valid(&folders, &params()));
    }

    #[rstest]
    fn test_one_missing_folder_invalidates_all(library: Library) {
        let folders = vec![library.folder()];
        let mut cache = library.cache();
        cache.save(&library.records(), &folders, &params()).unwrap();
        let other = TempDir::new().unwrap();
        let both = vec![library.folder(), other.path().to_path_buf()];
        assert!(!cache.is_valid(&both, &params()));
    }

    #[rstest]
    #[case(&["marvel", "01"], true, &["Marvel Team-Up Episode 01.cbr"])]
    #[case(&["batman", "superman"], true, &[])]
    #[case(&["batman", "superman"], false, &["Batman #1.cbz", "Superman #1.cbz"])]
    #[case(&["MAN"], false, &["Batman #1.cbz", "Superman #1.cbz"])]
    #[case(&["team-up"], true, &["Marvel Team-Up Episode 01.cbr", "Marvel Team-Up Episode 02.cbr"])]
    #[case(&["#1"], true, &["Batman #1.cbz", "Superman #1.cbz"])]
    fn test_keywords(
        library: Library,
        #[case] keywords: &[&str],
        #[case] match_all: bool,
        #[case] expected: &[&str],
    ) {
        let folders = vec![library.folder()];
        let mut cache = library.cache();
        cache.save(&library.records(), &folders, &params()).unwrap();
        assert_eq!(names(cache.get_cached_files(keywords, match_all)), expected);

        // Without the index, the linear scan gives the same answer.
        fs::remove_file(cache.dir().join(INDEX_FILE)).unwrap();
        let mut unindexed = library.cache();
        assert!(!unindexed.info().has_index);
        assert_eq!(names(unindexed.get_cached_files(keywords, match_all)), expected);
    }

    #[rstest]
    fn test_index_covers_previously_cached_folders(library: Library) {
        let other = TempDir::new().unwrap();
        File::create(other.path().join("Dune 1.epub")).unwrap();
        let other_folder = other.path().canonicalize().unwrap();
        let mut cache = library.cache();
        cache.save(&library.records(), &[library.folder()], &params()).unwrap();
        let dune = FileRecord::new(other_folder.join("Dune 1.epub"));
        cache.save(&[dune], &[other_folder], &params()).unwrap();

        let mut reopened = library.cache();
        assert_eq!(names(reopened.get_cached_files(&["batman"], false)), ["Batman #1.cbz"]);
        assert_eq!(names(reopened.get_cached_files(&["dune"], false)), ["Dune 1.epub"]);
    }

    #[test]
    fn test_nested_folders_are_not_counted_twice() {
        let root = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let top = root.path().canonicalize().unwrap();
        let sub = top.join("sub");
        fs::create_dir(&sub).unwrap();
        let outer = FileRecord::new(top.join("top.txt"));
        let inner = FileRecord::new(sub.join("inner.txt"));

        let mut cache = DirectoryCache::open(cache_dir.path());
        cache.save(&[inner.clone()], &[sub.clone()], &params()).unwrap();
        cache.save(&[outer, inner], &[top.clone()], &params()).unwrap();

        let mut reopened = DirectoryCache::open(cache_dir.path());
        assert_eq!(
            names(reopened.get_cached_files_in::<&str>(&[top.clone()], &[], false)),
            ["inner.txt", "top.txt"]
        );
        assert_eq!(names(reopened.get_cached_files_in(&[sub], &["txt"], false)), ["inner.txt"]);
        assert_eq!(names(reopened.get_cached_files_in(&[top], &["inner"], false)), ["inner.txt"]);
        assert_eq!(reopened.get_cached_files::<&str>(&[], false).len(), 2);
    }

    #[rstest]
    fn test_clear_and_info(library: Library) {
        let folders = vec![library.folder()];
        let mut cache = library.cache();
        cache.save(&library.records(), &folders, &params()).unwrap();

        let info = cache.info();
        assert_eq!(info.folder_count, 1);
        assert_eq!(info.file_count, 4);
        assert!(info.has_index);
        assert!(info.indexed_tokens > 0);
        assert!(info.size_bytes > 0);
        assert_eq!(info.folders[0].folder, library.folder());
        assert_eq!(info.folders[0].files, 4);

        cache.clear().unwrap();
        assert!(!cache.is_valid(&folders, &params()));
        assert!(cache.get_cached_files::<&str>(&[], false).is_empty());
        assert_eq!(fs::read_dir(cache.dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_missing_directory() {
        let dir = TempDir::new().unwrap();
        let mut cache = DirectoryCache::open(dir.path().join("never-created"));
        cache.clear().unwrap();
    }

    #[test]
    fn test_folder_key_is_stable() {
        let dir = TempDir::new().unwrap();
        let key = folder_key(dir.path());
        assert_eq!(key.len(), 16);
        assert_eq!(key, folder_key(&dir.path().join(".")));
    }
}
