//! ANSI control sequences used by the incremental redraw.
//!
//! Helpers return owned `String`s (or static slices) so the diff engine can
//! append them to its output buffer without going through a terminal backend.

const CSI: &str = "\x1b[";

/// Move the cursor down `lines`, placing it at column 1 of the destination row.
pub fn move_down_lines(lines: usize) -> String {
    if lines == 0 {
        String::new()
    } else {
        format!("{CSI}{lines}E")
    }
}

/// Move the cursor up `lines`, placing it at column 1 of the destination row.
pub fn move_up_lines(lines: usize) -> String {
    if lines == 0 {
        String::new()
    } else {
        format!("{CSI}{lines}F")
    }
}

/// Clear from the cursor to the end of the line.
pub fn clear_to_line_end() -> &'static str {
    "\x1b[K"
}

/// Clear from the cursor to the end of the screen.
pub fn clear_to_screen_end() -> &'static str {
    "\x1b[J"
}

/// Stop the terminal from wrapping lines wider than the screen.
pub fn disable_autowrap() -> &'static str {
    "\x1b[?7l"
}

/// Restore automatic line wrapping.
pub fn enable_autowrap() -> &'static str {
    "\x1b[?7h"
}
