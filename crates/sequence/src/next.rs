use crate::filter::Filter;
use crate::models::{Collection, FileEntry};
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

/// Anything that remembers which files have already been consumed.
pub trait ReadLog {
    fn is_read(&mut self, path: &Path) -> bool;
}

impl ReadLog for std::collections::HashSet<PathBuf> {
    fn is_read(&mut self, path: &Path) -> bool {
        self.contains(path)
    }
}

/// The next item to consume, along with the collection it continues.
#[derive(Debug, Clone, PartialEq)]
pub struct NextUnread<'a> {
    pub collection: &'a Collection,
    pub entry: &'a FileEntry,
}
impl NextUnread<'_> {
    pub fn path(&self) -> &Path {
        &self.entry.path
    }
}

/// Lowest-numbered entry of the collection that is unread and passes the
/// keyword rule.
pub fn first_unread<'a>(collection: &'a Collection, log: &mut impl ReadLog, filter: &Filter) -> Option<&'a FileEntry> {
    collection
        .files()
        .iter()
        .find(|entry| filter.matches_keywords(&entry.filename) && !log.is_read(&entry.path))
}

/// First unread entry of one collection, picked uniformly at random among
/// the collections that still have one.
pub fn next_unread<'a, R: Rng + ?Sized>(
    collections: &'a [Collection],
    log: &mut impl ReadLog,
    filter: &Filter,
    rng: &mut R,
) -> Option<NextUnread<'a>> {
    let candidates: Vec<NextUnread<'a>> = collections
        .iter()
        .filter_map(|collection| {
            first_unread(collection, &mut *log, filter).map(|entry| NextUnread { collection, entry })
        })
        .collect();
    candidates.choose(rng).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scheme;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn collection(name: &str, count: u32) -> Collection {
        let folder = PathBuf::from("/library");
        let files = (1..=count)
            .map(|n| {
                let filename = format!("{name} #{n}.cbz");
                FileEntry {
                    path: folder.join(&filename),
                    filename,
                    number: f64::from(n),
                    scheme: Scheme::HashDecimal,
                    collection_name: name.to_string(),
                }
            })
            .collect();
        Collection {
            folder,
            collection_name: name.to_string(),
            scheme: Scheme::HashDecimal,
            files,
        }
    }

    #[test]
    fn test_first_unread_skips_read_entries() {
        let batman = collection("Batman", 3);
        let mut log: HashSet<PathBuf> = HashSet::from([PathBuf::from("/library/Batman #1.cbz")]);
        let entry = first_unread(&batman, &mut log, &Filter::new()).unwrap();
        assert_eq!(entry.filename, "Batman #2.cbz");
    }

    #[test]
    fn test_first_unread_exhausted() {
        let batman = collection("Batman", 2);
        let mut log: HashSet<PathBuf> = batman.files().iter().map(|file| file.path.clone()).collect();
        assert!(first_unread(&batman, &mut log, &Filter::new()).is_none());
    }

    #[test]
    fn test_first_unread_respects_keywords() {
        let batman = collection("Batman", 3);
        let filter = Filter::new().with_keywords(["#3"], true);
        let entry = first_unread(&batman, &mut HashSet::<PathBuf>::new(), &filter).unwrap();
        assert_eq!(entry.filename, "Batman #3.cbz");
    }

    #[test]
    fn test_next_unread_skips_consumed_collections() {
        let collections = [collection("Batman", 2), collection("Superman", 2)];
        let mut log: HashSet<PathBuf> = collections[0].files().iter().map(|file| file.path.clone()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let next = next_unread(&collections, &mut log, &Filter::new(), &mut rng).unwrap();
            assert_eq!(next.collection.collection_name, "Superman");
            assert_eq!(next.path(), Path::new("/library/Superman #1.cbz"));
        }
    }

    #[test]
    fn test_next_unread_reaches_every_collection() {
        let collections = [collection("Batman", 2), collection("Superman", 2)];
        let mut rng = StdRng::seed_from_u64(42);
        let seen: HashSet<String> = (0..50)
            .filter_map(|_| next_unread(&collections, &mut HashSet::<PathBuf>::new(), &Filter::new(), &mut rng))
            .map(|next| next.collection.collection_name.clone())
            .collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_next_unread_nothing_left() {
        let collections = [collection("Batman", 2)];
        let mut log: HashSet<PathBuf> = collections[0].files().iter().map(|file| file.path.clone()).collect();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(next_unread(&collections, &mut log, &Filter::new(), &mut rng).is_none());
        assert!(next_unread(&[], &mut log, &Filter::new(), &mut rng).is_none());
    }
}
