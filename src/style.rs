//! Text decoration: ANSI colors and elapsed-time formatting.

use std::time::Duration;

/// Sequence that resets all SGR attributes.
pub const RESET: &str = "\x1b[0m";

/// The eight basic ANSI foreground colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl AnsiColor {
    fn code(self) -> u8 {
        match self {
            AnsiColor::Black => 0,
            AnsiColor::Red => 1,
            AnsiColor::Green => 2,
            AnsiColor::Yellow => 3,
            AnsiColor::Blue => 4,
            AnsiColor::Magenta => 5,
            AnsiColor::Cyan => 6,
            AnsiColor::White => 7,
        }
    }

    pub fn sequence(self) -> String {
        format!("\x1b[3{}m", self.code())
    }
}

/// Wrap `text` in the color's escape sequence followed by a reset.
pub fn colorize(color: AnsiColor, text: &str) -> String {
    format!("{}{text}{RESET}", color.sequence())
}

/// Like [`colorize`], but leaves the text untouched when no color is set.
pub fn maybe_colorize(color: Option<AnsiColor>, text: &str) -> String {
    match color {
        Some(color) => colorize(color, text),
        None => text.to_string(),
    }
}

/// Title colors for the three node outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub success: Option<AnsiColor>,
    pub failure: Option<AnsiColor>,
    pub neutral: Option<AnsiColor>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            success: Some(AnsiColor::Green),
            failure: Some(AnsiColor::Red),
            neutral: Some(AnsiColor::Yellow),
        }
    }
}

impl ColorScheme {
    /// A scheme that emits no color sequences at all.
    pub fn plain() -> Self {
        Self {
            success: None,
            failure: None,
            neutral: None,
        }
    }
}

/// Default cut-off under which [`format_duration`] shows tenths of a second.
pub const FINE_DURATION_THRESHOLD: Duration = Duration::from_secs(10);

/// Format an elapsed time for a title line.
///
/// `fine` requests sub-second precision, honoured only below
/// [`FINE_DURATION_THRESHOLD`].
pub fn format_duration(duration: Duration, fine: bool) -> String {
    format_duration_with(duration, fine, FINE_DURATION_THRESHOLD)
}

pub fn format_duration_with(duration: Duration, fine: bool, threshold: Duration) -> String {
    if fine && duration < threshold {
        return format!("{:.1}s", duration.as_millis() as f64 / 1000.0);
    }
    let total = duration.as_secs();
    let seconds = total % 60;
    if total < 60 {
        return format!("{seconds}s");
    }
    let minutes = (total / 60) % 60;
    if total < 3600 {
        return format!("{minutes:02}:{seconds:02}");
    }
    let hours = total / 3600;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
