//! Grapheme cluster display width.
//!
//! `egc_width` is the single authority for how many terminal cells one
//! extended grapheme cluster (EGC) occupies. Slide measurement sums it per
//! line, so an under-estimate would let the container shrink below the
//! rendered phrase.
//!
//! Precedence:
//! 1. Emoji signals (regional indicators, keycaps, pictographs in the
//!    primary emoji blocks, VS16 presentation) force width 2.
//! 2. Otherwise the cluster width from `unicode_width`, clamped to 2.
//!
//! Invariant: over-estimation is preferred. An extra blank cell is harmless;
//! a missing one clips the widest phrase.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const VS16: char = '\u{FE0F}';
const KEYCAP_COMBINING: char = '\u{20E3}';

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

// Primary emoji blocks; always rendered in emoji presentation.
fn is_emoji_block(c: char) -> bool {
    ('\u{1F300}'..='\u{1FAFF}').contains(&c)
}

// Misc Symbols + Dingbats: text presentation unless VS16 follows.
fn is_legacy_symbol(c: char) -> bool {
    ('\u{2600}'..='\u{27BF}').contains(&c)
}

fn has_emoji_signal(egc: &str) -> bool {
    let mut legacy = false;
    let mut vs16 = false;
    for c in egc.chars() {
        if is_regional_indicator(c) || is_emoji_block(c) || c == KEYCAP_COMBINING {
            return true;
        }
        legacy |= is_legacy_symbol(c);
        vs16 |= c == VS16;
    }
    legacy && vs16
}

/// Return the display column width for a single grapheme cluster.
///
/// Precondition: `egc` is one grapheme cluster; callers segment first.
#[inline]
pub fn egc_width(egc: &str) -> u16 {
    let mut chars = egc.chars();
    let Some(first) = chars.next() else {
        return 0;
    };
    if chars.next().is_none() && first.is_ascii() {
        return u16::from(!first.is_ascii_control());
    }
    if has_emoji_signal(egc) {
        return 2;
    }
    let base = UnicodeWidthStr::width(egc);
    let leading = UnicodeWidthChar::width(first).unwrap_or(0);
    base.max(leading).min(2) as u16
}
