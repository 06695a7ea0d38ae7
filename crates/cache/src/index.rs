use crate::models::FileRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

const MIN_TOKEN_LEN: usize = 2;

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '_' | '-') || c.is_whitespace()
}

/// Lowercased tokens of a file name, split on `.`, `_`, `-` and whitespace.
/// Single-character tokens are dropped.
pub(crate) fn tokenize(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(is_separator)
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Whether a keyword can be answered from the index alone.
///
/// A keyword that spans a separator, or is shorter than any indexed token,
/// can match a name without being inside one of its tokens.
pub(crate) fn is_indexable(keyword: &str) -> bool {
    keyword.chars().count() >= MIN_TOKEN_LEN && !keyword.contains(is_separator)
}

/// Inverted index from filename token to the paths whose name contains it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordIndex {
    tokens: BTreeMap<String, BTreeSet<PathBuf>>,
}
impl KeywordIndex {
    pub fn build<'a>(files: impl IntoIterator<Item = &'a FileRecord>) -> Self {
        let mut tokens: BTreeMap<String, BTreeSet<PathBuf>> = BTreeMap::new();
        for file in files {
            for token in tokenize(&file.name) {
                tokens.entry(token).or_default().insert(file.path.clone());
            }
        }
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Paths with any token containing `keyword`, which must be lowercase.
    pub fn lookup(&self, keyword: &str) -> BTreeSet<&PathBuf> {
        self.tokens
            .iter()
            .filter(|(token, _)| token.contains(keyword))
            .flat_map(|(_, paths)| paths)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case("Marvel Team-Up Episode 01.cbr", &["marvel", "team", "up", "episode", "01", "cbr"])]
    #[case("A_Floresta.Vol.2.epub", &["floresta", "vol", "epub"])]
    #[case("Batman #3.cbz", &["batman", "#3", "cbz"])]
    fn test_tokenize(#[case] name: &str, #[case] expected: &[&str]) {
        assert_eq!(tokenize(name), expected);
    }

    #[rstest]
    #[case("marvel", true)]
    #[case("team-up", false)]
    #[case("team up", false)]
    #[case("x", false)]
    fn test_is_indexable(#[case] keyword: &str, #[case] expected: bool) {
        assert_eq!(is_indexable(keyword), expected);
    }

    #[test]
    fn test_lookup_matches_token_substrings() {
        let files = [
            FileRecord::new("/comics/Batman #1.cbz"),
            FileRecord::new("/comics/Superman #1.cbz"),
            FileRecord::new("/books/Dune.epub"),
        ];
        let index = KeywordIndex::build(&files);
        let hits = index.lookup("man");
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&PathBuf::from("/comics/Batman #1.cbz")));
        assert_eq!(index.lookup("dune").into_iter().collect::<Vec<_>>(), [Path::new("/books/Dune.epub")]);
        assert!(index.lookup("nothing").is_empty());
    }
}
