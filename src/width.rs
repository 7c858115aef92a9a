//! Terminal display width helpers.
//!
//! Title lines carry color escapes, so widths are measured after stripping ANSI
//! sequences.

use unicode_width::UnicodeWidthChar;

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Whether the first glyph of `text` occupies two terminal cells.
pub fn starts_with_wide_glyph(text: &str) -> bool {
    text.chars()
        .next()
        .and_then(UnicodeWidthChar::width)
        .is_some_and(|w| w >= 2)
}
