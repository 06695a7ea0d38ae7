use std::fmt::{Display, Formatter, Result as FmtResult};

/// The pattern family a filename's ordering number was parsed under.
///
/// Listed in the priority order the classifier tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "snake_case"))]
pub enum Scheme {
    /// Leading digits: `001 - Title`
    Decimal,
    /// Hash-prefixed digits: `Title #001`
    HashDecimal,
    /// Position out of a total: `01 de 10`, `5 of 20`
    XOfY,
    /// `Cap 1`, `Capitulo 1`, `Ch. 1`, `Chapter 1`
    Chapter,
    /// `Vol 1`, `Volume 1`
    Volume,
    /// `Part 1`, `Parte 1`
    Part,
    /// `Ep 1`, `Episode 1`, `Episodio 1`
    Episode,
    /// A standalone roman numeral: `Rocky II`
    Roman,
    /// The first run of digits anywhere in the name.
    Fallback,
}
impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Decimal => "decimal",
            Scheme::HashDecimal => "hash_decimal",
            Scheme::XOfY => "x_of_y",
            Scheme::Chapter => "chapter",
            Scheme::Volume => "volume",
            Scheme::Part => "part",
            Scheme::Episode => "episode",
            Scheme::Roman => "roman",
            Scheme::Fallback => "fallback",
        }
    }
}
impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// An ordering value extracted from a filename.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileNumber {
    pub value: f64,
    pub scheme: Scheme,
}
impl FileNumber {
    pub fn new(value: f64, scheme: Scheme) -> Self {
        Self { value, scheme }
    }
}
impl From<(f64, Scheme)> for FileNumber {
    fn from((value, scheme): (f64, Scheme)) -> Self {
        FileNumber::new(value, scheme)
    }
}
