//! Identity normalization.

use crate::types::{PassiveError, Result};

/// Marker conventionally used to prefix handles (`@alice`).
pub const HANDLE_MARKER: char = '@';

/// Strip a handle marker from a raw identity.
///
/// When the marker is present the handle is the text between the first
/// marker and the next one (or the end of the string). Otherwise the input is
/// returned unchanged. The result never contains the marker, so normalizing
/// twice is the same as normalizing once.
pub fn normalize(raw: &str) -> &str {
    match raw.split_once(HANDLE_MARKER) {
        Some((_, rest)) => rest.split(HANDLE_MARKER).next().unwrap_or(rest),
        None => raw,
    }
}

/// A first/last name pair for person lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName {
    pub first: String,
    pub last: String,
}

impl FullName {
    /// Parse free text into a title-cased first and last name.
    ///
    /// Words past the second are ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut words = raw.split_whitespace().map(title_case);
        match (words.next(), words.next()) {
            (Some(first), Some(last)) => Ok(Self { first, last }),
            _ => Err(PassiveError::InvalidInput(
                "please write both first and last name".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for FullName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first, self.last)
    }
}

/// Lower-case a word and capitalize its first letter.
fn title_case(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
