use regex::Regex;
use std::sync::LazyLock;

// Separators allowed between a label ("Chapter", "Vol", ...) and its number.
const LABEL_GAP: &str = r"[.\s-]*";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Ordering patterns, listed in the priority they are tried. Every pattern
// captures the ordering number in group 1; group 0 is the anchor whose start
// position truncates the collection name.
regex!(DECIMAL_REGEX, r"^(\d+)");
regex!(HASH_DECIMAL_REGEX, r"#(\d+)");
regex!(X_OF_Y_REGEX, r"(?i)(\d+)\s*(?:de|of|/)\s*\d+");
regex!(CHAPTER_REGEX, format!(r"(?i)(?:cap(?:itulo)?|ch(?:apter)?){LABEL_GAP}(\d+)").as_str());
regex!(VOLUME_REGEX, format!(r"(?i)vol(?:ume)?{LABEL_GAP}(\d+)").as_str());
regex!(PART_REGEX, format!(r"(?i)parte?{LABEL_GAP}(\d+)").as_str());
regex!(EPISODE_REGEX, format!(r"(?i)(?:ep(?:isode)?|episodio){LABEL_GAP}(\d+)").as_str());
// Bounded to MMMCMXCIX (3999). Every group is optional, so this regex also
// matches the empty string; callers must skip empty matches.
regex!(
    ROMAN_REGEX,
    r"(?i)\b(M{0,3}(?:CM|CD|D?C{0,3})(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3}))\b"
);
regex!(FALLBACK_REGEX, r"(\d+)");
