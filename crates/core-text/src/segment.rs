//! Delimiter segmentation into phrases.
//!
//! Contract:
//! - Input: raw element text plus a delimiter used literally (no pattern
//!   semantics; whatever the caller passes is matched byte-for-byte).
//! - Output: `Segmentation::Phrases` with one trimmed [`Phrase`] per field, in
//!   order, or `Segmentation::NotSegmentable` when fewer than two fields exist.
//! - Empty fields (consecutive delimiters) survive as empty phrases.
//! - An empty delimiter splits between grapheme clusters.
//! - Does not log content; only field counts are traced.

use std::fmt;
use unicode_segmentation::UnicodeSegmentation;

/// One trimmed field of the original delimited text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Phrase(String);

impl Phrase {
    /// Build a phrase from a raw field, trimming surrounding whitespace.
    pub fn new(field: &str) -> Self {
        Self(field.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for Phrase {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of segmenting element text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segmentation {
    /// Two or more phrases; rotation applies.
    Phrases(Vec<Phrase>),
    /// The delimiter split produced a single field (or none). Callers must
    /// leave the original content untouched.
    NotSegmentable,
}

impl Segmentation {
    pub fn phrases(&self) -> Option<&[Phrase]> {
        match self {
            Segmentation::Phrases(p) => Some(p),
            Segmentation::NotSegmentable => None,
        }
    }

    pub fn into_phrases(self) -> Option<Vec<Phrase>> {
        match self {
            Segmentation::Phrases(p) => Some(p),
            Segmentation::NotSegmentable => None,
        }
    }
}

/// Split `raw` on the literal `delim` and trim every field.
pub fn segment(raw: &str, delim: &str) -> Segmentation {
    let fields: Vec<&str> = if delim.is_empty() {
        raw.graphemes(true).collect()
    } else {
        raw.split(delim).collect()
    };

    tracing::trace!(
        target: "text.segment",
        fields = fields.len(),
        delim_len = delim.len(),
        "segment"
    );

    if fields.len() < 2 {
        return Segmentation::NotSegmentable;
    }
    Segmentation::Phrases(fields.into_iter().map(Phrase::new).collect())
}
