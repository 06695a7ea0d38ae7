use crate::classify::classify;
use crate::error::{ErrorKind, Result};
use crate::filter::Filter;
use crate::models::{Collection, FileEntry, Scheme};
use exn::ResultExt;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Sorted names of the regular files directly inside `folder`.
///
/// Entries that fail to read are skipped; the second value counts them.
fn list_files(folder: &Path) -> Result<(Vec<(String, PathBuf)>, usize)> {
    let entries =
        fs::read_dir(folder).or_raise(|| ErrorKind::FolderUnavailable(folder.to_path_buf()))?;
    let mut skipped = 0;
    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(folder = %folder.display(), error = %err, "skipping unreadable entry");
                skipped += 1;
                continue;
            },
        };
        let is_file = match entry.file_type() {
            Ok(file_type) => file_type.is_file(),
            Err(err) => {
                tracing::debug!(path = %entry.path().display(), error = %err, "skipping unreadable entry");
                skipped += 1;
                continue;
            },
        };
        if !is_file {
            continue;
        }
        // Names that are not valid UTF-8 cannot be classified.
        if let Ok(name) = entry.file_name().into_string() {
            files.push((name, entry.path()));
        }
    }
    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok((files, skipped))
}

/// Most frequent scheme; ties go to whichever appeared first.
fn dominant_scheme(files: &[FileEntry]) -> Option<Scheme> {
    let mut counts: Vec<(Scheme, usize)> = Vec::new();
    for file in files {
        match counts.iter_mut().find(|(scheme, _)| *scheme == file.scheme) {
            Some((_, count)) => *count += 1,
            None => counts.push((file.scheme, 1)),
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(Scheme, usize)>, (scheme, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((scheme, count)),
        })
        .map(|(scheme, _)| scheme)
}

/// Group the files directly inside `folder` into numbered collections.
///
/// Returns `Ok(None)` when the folder holds no sequence: fewer than two
/// numbered files pass the filter, or no group keeps two files of one scheme.
/// Collections come back in the order their first file appears
/// alphabetically, each sorted by ordering value.
#[instrument(level = "debug", skip_all, fields(folder = %folder.display()))]
pub fn analyze(folder: &Path, filter: &Filter) -> Result<Option<Vec<Collection>>> {
    let (files, skipped) = list_files(folder)?;
    if skipped > 0 {
        tracing::debug!(skipped, "unreadable entries skipped during analysis");
    }

    let numbered: Vec<FileEntry> = files
        .into_iter()
        .filter(|(name, _)| filter.accepts(name))
        .filter_map(|(filename, path)| {
            classify(&filename).map(|(number, collection_name)| FileEntry {
                path,
                filename,
                number: number.value,
                scheme: number.scheme,
                collection_name,
            })
        })
        .collect();
    if numbered.len() < 2 {
        return Ok(None);
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<FileEntry>> = HashMap::new();
    for entry in numbered {
        if !groups.contains_key(&entry.collection_name) {
            order.push(entry.collection_name.clone());
        }
        groups.entry(entry.collection_name.clone()).or_default().push(entry);
    }

    let mut collections = Vec::new();
    for name in order {
        let Some(files) = groups.remove(&name) else {
            continue;
        };
        if files.len() < 2 {
            continue;
        }
        let Some(scheme) = dominant_scheme(&files) else {
            continue;
        };
        let mut files: Vec<FileEntry> = files.into_iter().filter(|file| file.scheme == scheme).collect();
        if files.len() < 2 {
            continue;
        }
        files.sort_by(|a, b| a.number.total_cmp(&b.number));
        collections.push(Collection {
            folder: folder.to_path_buf(),
            collection_name: name,
            scheme,
            files,
        });
    }

    tracing::debug!(collections = collections.len(), "folder analyzed");
    Ok((!collections.is_empty()).then_some(collections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use tempfile::TempDir;

    fn folder_with(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            File::create(dir.path().join(name)).unwrap();
        }
        dir
    }

    #[fixture]
    fn comics() -> TempDir {
        folder_with(&[
            "Superman #2.cbz",
            "Batman #3.cbz",
            "Batman #1.cbz",
            "Superman #1.cbz",
            "Batman #2.cbz",
            "cover.jpg",
        ])
    }

    fn names(collection: &Collection) -> Vec<&str> {
        collection.files().iter().map(|file| file.filename.as_str()).collect()
    }

    #[rstest]
    fn test_collections_are_isolated(comics: TempDir) {
        let collections = analyze(comics.path(), &Filter::new()).unwrap().unwrap();
        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].collection_name, "Batman");
        assert_eq!(names(&collections[0]), ["Batman #1.cbz", "Batman #2.cbz", "Batman #3.cbz"]);
        assert_eq!(collections[1].collection_name, "Superman");
        assert_eq!(names(&collections[1]), ["Superman #1.cbz", "Superman #2.cbz"]);
    }

    #[rstest]
    fn test_collection_invariant(comics: TempDir) {
        for collection in analyze(comics.path(), &Filter::new()).unwrap().unwrap() {
            assert!(collection.count() >= 2);
            assert_eq!(collection.count(), collection.files().len());
            assert!(collection.files().iter().all(|file| file.scheme == collection.scheme));
            assert!(collection.files().windows(2).all(|pair| pair[0].number <= pair[1].number));
        }
    }

    #[rstest]
    fn test_keywords_restrict_collections(comics: TempDir) {
        let filter = Filter::new().with_keywords(["superman"], false);
        let collections = analyze(comics.path(), &filter).unwrap().unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].collection_name, "Superman");
    }

    #[test]
    fn test_sorts_by_value_not_name() {
        let dir = folder_with(&["Saga Vol 10.cbz", "Saga Vol 2.cbz", "Saga Vol 1.cbz"]);
        let collections = analyze(dir.path(), &Filter::new()).unwrap().unwrap();
        assert_eq!(names(&collections[0]), ["Saga Vol 1.cbz", "Saga Vol 2.cbz", "Saga Vol 10.cbz"]);
        assert_eq!(collections[0].scheme, Scheme::Volume);
    }

    #[test]
    fn test_minority_scheme_is_dropped() {
        // "Saga 1 of 3" parses as x_of_y, outnumbered by two volumes.
        let dir = folder_with(&["Saga Vol 1.cbz", "Saga Vol 2.cbz", "Saga 1 of 3.cbz"]);
        let collections = analyze(dir.path(), &Filter::new()).unwrap().unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].count(), 2);
        assert_eq!(collections[0].scheme, Scheme::Volume);
    }

    #[test]
    fn test_scheme_tie_goes_to_first_seen() {
        let dir = folder_with(&["Saga Ch 1.cbz", "Saga Vol 1.cbz"]);
        // One file per scheme: the dominant scheme keeps a single file, so the
        // group does not survive.
        assert!(analyze(dir.path(), &Filter::new()).unwrap().is_none());

        let dir = folder_with(&["Saga Ch 1.cbz", "Saga Ch 2.cbz", "Saga Vol 1.cbz", "Saga Vol 2.cbz"]);
        let collections = analyze(dir.path(), &Filter::new()).unwrap().unwrap();
        assert_eq!(collections[0].scheme, Scheme::Chapter);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["Only #1.cbz"])]
    #[case(&["Alpha #1.cbz", "Beta #1.cbz"])]
    #[case(&["notes.txt", "readme.md"])]
    fn test_no_sequence(#[case] files: &[&str]) {
        let dir = folder_with(files);
        assert!(analyze(dir.path(), &Filter::new()).unwrap().is_none());
    }

    #[test]
    fn test_skips_excluded_ignored_and_directories() {
        let dir = folder_with(&["A #1.cbz", "_L_A #2.cbz", "A #3.txt", "A #4.cbz"]);
        std::fs::create_dir(dir.path().join("A #5")).unwrap();
        let filter = Filter::new().with_exclude_prefix("_L_").with_ignored_extensions(["txt"]);
        let collections = analyze(dir.path(), &filter).unwrap().unwrap();
        assert_eq!(names(&collections[0]), ["A #1.cbz", "A #4.cbz"]);
    }

    #[test]
    fn test_bare_numbers_group_together() {
        let dir = folder_with(&["Vol 02.pdf", "Vol 01.pdf"]);
        let collections = analyze(dir.path(), &Filter::new()).unwrap().unwrap();
        assert_eq!(collections[0].collection_name, "");
        assert_eq!(names(&collections[0]), ["Vol 01.pdf", "Vol 02.pdf"]);
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = analyze(&dir.path().join("missing"), &Filter::new()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::FolderUnavailable(_)));
        assert!(err.is_retryable());
    }
}
