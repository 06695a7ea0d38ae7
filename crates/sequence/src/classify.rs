//! Filename classification.
//!
//! Every numbered filename has exactly one *anchor*: the substring that
//! carries its ordering number. The ordering value and the collection name are
//! both read from the same anchor, so they can never disagree about which part
//! of the name is the number.

use crate::consts::{
    CHAPTER_REGEX, DECIMAL_REGEX, EPISODE_REGEX, FALLBACK_REGEX, HASH_DECIMAL_REGEX, PART_REGEX,
    ROMAN_REGEX, VOLUME_REGEX, X_OF_Y_REGEX,
};
use crate::models::{FileNumber, Scheme};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const TRAILING_SEPARATORS: &[char] = &['-', '_', '.', '#'];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    number: FileNumber,
    start: usize,
}

fn stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
}

fn capture(regex: &Regex, scheme: Scheme, stem: &str) -> Option<Anchor> {
    let captures = regex.captures(stem)?;
    let value = captures.get(1)?.as_str().parse::<f64>().ok()?;
    Some(Anchor {
        number: FileNumber::new(value, scheme),
        start: captures.get(0)?.start(),
    })
}

fn roman(stem: &str) -> Option<Anchor> {
    ROMAN_REGEX
        .find_iter(stem)
        .filter(|found| !found.is_empty())
        .find_map(|found| {
            roman_to_decimal(found.as_str()).map(|value| Anchor {
                number: FileNumber::new(f64::from(value), Scheme::Roman),
                start: found.start(),
            })
        })
}

fn locate_anchor(stem: &str) -> Option<Anchor> {
    let prefixed: [(&LazyLock<Regex>, Scheme); 7] = [
        (&DECIMAL_REGEX, Scheme::Decimal),
        (&HASH_DECIMAL_REGEX, Scheme::HashDecimal),
        (&X_OF_Y_REGEX, Scheme::XOfY),
        (&CHAPTER_REGEX, Scheme::Chapter),
        (&VOLUME_REGEX, Scheme::Volume),
        (&PART_REGEX, Scheme::Part),
        (&EPISODE_REGEX, Scheme::Episode),
    ];
    prefixed
        .into_iter()
        .find_map(|(regex, scheme)| capture(regex, scheme, stem))
        .or_else(|| roman(stem))
        .or_else(|| capture(&FALLBACK_REGEX, Scheme::Fallback, stem))
}

fn collection_name(stem: &str, anchor: Option<&Anchor>) -> String {
    match anchor {
        Some(anchor) => stem[..anchor.start]
            .trim_end_matches(|c: char| c.is_whitespace() || TRAILING_SEPARATORS.contains(&c))
            .to_string(),
        None => stem.to_string(),
    }
}

/// Extract the ordering number of a filename, ignoring its extension.
///
/// Returns `None` when the name carries no recognizable number.
#[must_use]
pub fn extract_number(filename: &str) -> Option<FileNumber> {
    locate_anchor(stem(filename)).map(|anchor| anchor.number)
}

/// Name of the collection a filename belongs to: the stem, cut where its
/// ordering number starts, minus any trailing separators.
///
/// A name without a number is returned as its full stem. A name that *is* its
/// number (`001.cbz`, `Vol 01.pdf`) yields an empty string.
#[must_use]
pub fn strip_number(filename: &str) -> String {
    let stem = stem(filename);
    collection_name(stem, locate_anchor(stem).as_ref())
}

/// Both outputs of classification at once: the ordering number and the
/// collection name, or `None` when the filename has no number.
#[must_use]
pub fn classify(filename: &str) -> Option<(FileNumber, String)> {
    let stem = stem(filename);
    let anchor = locate_anchor(stem)?;
    Some((anchor.number, collection_name(stem, Some(&anchor))))
}

/// Convert a roman numeral to its value using the subtractive rule.
///
/// Case-insensitive. Returns `None` for an empty string or any character that
/// is not a roman digit.
#[must_use]
pub fn roman_to_decimal(roman: &str) -> Option<u32> {
    if roman.is_empty() {
        return None;
    }
    let mut total: u32 = 0;
    let mut previous: u32 = 0;
    for c in roman.chars().rev() {
        let value = match c.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        if value < previous {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
        }
        previous = value;
    }
    Some(total)
}
