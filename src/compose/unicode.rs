//! Unicode classification used by the composer
//!
//! Width data comes from `unicode-width`, combining classes from
//! `unicode-normalization` and cluster boundaries from
//! `unicode-segmentation`. The terminal rules built on top of them
//! (control characters are -1, a multi-scalar character takes the widest
//! scalar) live here.

use unicode_normalization::char::{canonical_combining_class, is_combining_mark};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

pub const ZERO_WIDTH_JOINER: char = '\u{200D}';
/// VS15, request text presentation
pub const TEXT_PRESENTATION: char = '\u{FE0E}';
/// VS16, request emoji presentation
pub const EMOJI_PRESENTATION: char = '\u{FE0F}';

/// Sequence length implied by a UTF-8 lead byte: 1 for ASCII, 2-4 for a
/// valid lead, -1 for a continuation byte or an invalid lead
pub fn expected_utf8_len(lead: u8) -> i8 {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => -1,
    }
}

/// Column width of a scalar: 0, 1 or 2, or -1 for control characters
pub fn column_width(c: char) -> i8 {
    if c == '\0' {
        return -1;
    }
    match c.width() {
        Some(width) => width as i8,
        None => -1,
    }
}

/// Width of a character made of several scalars: the widest scalar, or -1
/// if any scalar is a control character
pub fn str_width(s: &str) -> i8 {
    let mut width = 0;
    for c in s.chars() {
        let w = column_width(c);
        if w < 0 {
            return -1;
        }
        width = width.max(w);
    }
    width
}

/// Fitzpatrick skin tone modifiers
pub fn is_emoji_modifier(c: char) -> bool {
    matches!(c, '\u{1F3FB}'..='\u{1F3FF}')
}

pub fn is_variation_selector(c: char) -> bool {
    matches!(
        c,
        '\u{FE00}'..='\u{FE0F}' | '\u{E0100}'..='\u{E01EF}' | '\u{180B}'..='\u{180D}' | '\u{180F}'
    )
}

/// Non-spacing or enclosing mark, or any scalar with a non-zero canonical
/// combining class
pub fn is_combining(c: char) -> bool {
    canonical_combining_class(c) != 0 || is_combining_mark(c)
}

/// Should this scalar try to join the previously written cell
pub fn wants_merge(c: char) -> bool {
    column_width(c) == 0
        || is_combining(c)
        || is_emoji_modifier(c)
        || is_variation_selector(c)
        || c == ZERO_WIDTH_JOINER
}

/// Number of extended grapheme clusters in `s`
pub fn grapheme_count(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Inclusive ranges of scalars that take an emoji presentation selector
const EMOJI_PRESENTATION_BASES: &[(u32, u32)] = &[
    (0x0023, 0x0023),
    (0x002A, 0x002A),
    (0x0030, 0x0039),
    (0x00A9, 0x00A9),
    (0x00AE, 0x00AE),
    (0x203C, 0x203C),
    (0x2049, 0x2049),
    (0x2122, 0x2122),
    (0x2139, 0x2139),
    (0x2194, 0x2199),
    (0x21A9, 0x21AA),
    (0x231A, 0x231B),
    (0x2328, 0x2328),
    (0x23CF, 0x23CF),
    (0x23E9, 0x23F3),
    (0x23F8, 0x23FA),
    (0x24C2, 0x24C2),
    (0x25AA, 0x25AB),
    (0x25B6, 0x25B6),
    (0x25C0, 0x25C0),
    (0x25FB, 0x25FE),
    (0x2600, 0x2604),
    (0x260E, 0x260E),
    (0x2611, 0x2611),
    (0x2614, 0x2615),
    (0x2618, 0x2618),
    (0x261D, 0x261D),
    (0x2620, 0x2620),
    (0x2622, 0x2623),
    (0x2626, 0x2626),
    (0x262A, 0x262A),
    (0x262E, 0x262F),
    (0x2638, 0x263A),
    (0x2640, 0x2640),
    (0x2642, 0x2642),
    (0x2648, 0x2653),
    (0x265F, 0x2660),
    (0x2663, 0x2663),
    (0x2665, 0x2666),
    (0x2668, 0x2668),
    (0x267B, 0x267B),
    (0x267E, 0x267F),
    (0x2692, 0x2697),
    (0x2699, 0x2699),
    (0x269B, 0x269C),
    (0x26A0, 0x26A1),
    (0x26A7, 0x26A7),
    (0x26AA, 0x26AB),
    (0x26B0, 0x26B1),
    (0x26BD, 0x26BE),
    (0x26C4, 0x26C5),
    (0x26C8, 0x26C8),
    (0x26CE, 0x26CF),
    (0x26D1, 0x26D1),
    (0x26D3, 0x26D4),
    (0x26E9, 0x26EA),
    (0x26F0, 0x26F5),
    (0x26F7, 0x26FA),
    (0x26FD, 0x26FD),
    (0x2702, 0x2702),
    (0x2705, 0x2705),
    (0x2708, 0x270D),
    (0x270F, 0x270F),
    (0x2712, 0x2712),
    (0x2714, 0x2714),
    (0x2716, 0x2716),
    (0x271D, 0x271D),
    (0x2721, 0x2721),
    (0x2728, 0x2728),
    (0x2733, 0x2734),
    (0x2744, 0x2744),
    (0x2747, 0x2747),
    (0x274C, 0x274C),
    (0x274E, 0x274E),
    (0x2753, 0x2755),
    (0x2757, 0x2757),
    (0x2763, 0x2764),
    (0x2795, 0x2797),
    (0x27A1, 0x27A1),
    (0x27B0, 0x27B0),
    (0x27BF, 0x27BF),
    (0x2934, 0x2935),
    (0x2B05, 0x2B07),
    (0x2B1B, 0x2B1C),
    (0x2B50, 0x2B50),
    (0x2B55, 0x2B55),
    (0x3030, 0x3030),
    (0x303D, 0x303D),
    (0x3297, 0x3297),
    (0x3299, 0x3299),
    (0x1F000, 0x1FAFF),
];

/// Whether `c` may be followed by VS15/VS16 to pick its presentation
pub fn accepts_emoji_presentation(c: char) -> bool {
    let code = c as u32;
    EMOJI_PRESENTATION_BASES
        .binary_search_by(|&(start, end)| {
            if end < code {
                std::cmp::Ordering::Less
            } else if start > code {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}
