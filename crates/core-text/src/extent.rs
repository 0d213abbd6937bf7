//! Natural (unconstrained, non-wrapping) extent of a phrase in terminal cells.
//!
//! Width is the widest line after NFC normalization, summed per grapheme
//! cluster through [`egc_width`]. Height is the number of lines. Empty text
//! has no line box and measures `0x0`.

use crate::egc_width;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Width/height pair in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent {
    pub width: u16,
    pub height: u16,
}

impl Extent {
    pub const ZERO: Extent = Extent {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Componentwise maximum.
    pub fn max(self, other: Extent) -> Extent {
        Extent {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Componentwise minimum; used to clip flow layout to a sized container.
    pub fn min(self, other: Extent) -> Extent {
        Extent {
            width: self.width.min(other.width),
            height: self.height.min(other.height),
        }
    }
}

/// Display width of a single line (no newline handling).
pub fn line_width(line: &str) -> u16 {
    let normalized: String = line.nfc().collect();
    normalized
        .graphemes(true)
        .fold(0u16, |acc, g| acc.saturating_add(egc_width(g)))
}

/// Measure `text` as if rendered without wrapping.
pub fn measure(text: &str) -> Extent {
    if text.is_empty() {
        return Extent::ZERO;
    }
    let mut width = 0u16;
    let mut height = 0u16;
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        width = width.max(line_width(line));
        height = height.saturating_add(1);
    }
    Extent { width, height }
}
