use std::path::Path;

/// Name-based rules deciding which files take part in a pick.
///
/// The same rules apply to directory entries, cached records and archive
/// members, so they only ever look at a bare file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    exclude_prefixes: Vec<String>,
    keywords: Vec<String>,
    match_all: bool,
    ignored_extensions: Vec<String>,
}
impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude names starting with any of the comma-separated prefixes.
    ///
    /// Blank entries are dropped, so an empty string excludes nothing.
    pub fn with_exclude_prefix(mut self, prefixes: &str) -> Self {
        self.exclude_prefixes = prefixes
            .split(',')
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Only accept names containing the keywords: all of them when
    /// `match_all` is set, any one of them otherwise.
    pub fn with_keywords<I, S>(mut self, keywords: I, match_all: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        self.match_all = match_all;
        self
    }

    /// Reject names by extension, compared case-insensitively. A leading dot
    /// is optional.
    pub fn with_ignored_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn exclude_prefixes(&self) -> &[String] {
        &self.exclude_prefixes
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn match_all(&self) -> bool {
        self.match_all
    }

    pub fn ignored_extensions(&self) -> &[String] {
        &self.ignored_extensions
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }

    pub fn is_ignored_extension(&self, name: &str) -> bool {
        if self.ignored_extensions.is_empty() {
            return false;
        }
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .is_some_and(|ext| self.ignored_extensions.contains(&ext))
    }

    pub fn matches_keywords(&self, name: &str) -> bool {
        matches_keywords(name, &self.keywords, self.match_all)
    }

    /// All three rules at once.
    pub fn accepts(&self, name: &str) -> bool {
        !self.is_excluded(name) && !self.is_ignored_extension(name) && self.matches_keywords(name)
    }
}

/// Keyword rule over a single name. Keywords must already be lowercase.
///
/// No keywords accepts everything.
pub fn matches_keywords<S: AsRef<str>>(name: &str, keywords: &[S], match_all: bool) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let name = name.to_lowercase();
    let mut hits = keywords.iter().map(|keyword| name.contains(keyword.as_ref()));
    if match_all { hits.all(|hit| hit) } else { hits.any(|hit| hit) }
}
