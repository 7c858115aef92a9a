use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Result, ScopeError};
use crate::style::{AnsiColor, maybe_colorize};

/// Glyphs of the default style: boundary, fill, tip, space, boundary.
pub const DEFAULT_STYLE: &str = "╢▌▌░╟";
/// wget-like ASCII style.
pub const SIMPLE_STYLE: &str = "[=>-]";

const STYLE_GLYPHS: usize = 5;
const FINISHED_MARKER: &str = " Done";

/// The five glyphs a bar is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarStyle {
    pub left: char,
    pub fill: char,
    pub tip: char,
    pub space: char,
    pub right: char,
}

impl BarStyle {
    /// Parse a style from exactly five glyphs.
    pub fn parse(glyphs: &str) -> Result<Self> {
        let chars: Vec<char> = glyphs.chars().collect();
        match chars.as_slice() {
            &[left, fill, tip, space, right] => Ok(Self {
                left,
                fill,
                tip,
                space,
                right,
            }),
            other => Err(ScopeError::InvalidBarStyle { found: other.len() }),
        }
    }
}

impl Default for BarStyle {
    fn default() -> Self {
        Self {
            left: '╢',
            fill: '▌',
            tip: '▌',
            space: '░',
            right: '╟',
        }
    }
}

impl fmt::Display for BarStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.left, self.fill, self.tip, self.space, self.right
        )
    }
}

#[derive(Debug)]
struct BarState {
    style: BarStyle,
    total: i64,
    current: i64,
    percentage: u8,
}

/// Horizontal progress gauge with its own lock, independent of the owning
/// node's lock.
#[derive(Debug)]
pub struct ProgressBar {
    state: Mutex<BarState>,
}

impl ProgressBar {
    /// Create a bar tracking `total` units. Non-positive totals are treated as 1.
    pub fn new(total: i64, style: BarStyle) -> Self {
        Self {
            state: Mutex::new(BarState {
                style,
                total: total.max(1),
                current: 0,
                percentage: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_progress(&self, value: i64) {
        let mut state = self.lock();
        state.current = value.clamp(0, state.total);
        state.percentage = percentage_of(state.current, state.total);
    }

    /// Advance by `delta` units, never past the total.
    pub fn add_progress(&self, delta: i64) {
        let mut state = self.lock();
        state.current = state.current.saturating_add(delta).clamp(0, state.total);
        state.percentage = percentage_of(state.current, state.total);
    }

    pub fn set_percentage(&self, percentage: i64) {
        let mut state = self.lock();
        let pct = percentage.clamp(0, 100);
        state.percentage = pct as u8;
        state.current = units_for(pct, state.total);
    }

    pub fn add_percentage(&self, delta: i64) {
        let mut state = self.lock();
        let pct = (state.percentage as i64).saturating_add(delta).clamp(0, 100);
        state.percentage = pct as u8;
        state.current = units_for(pct, state.total);
    }

    pub fn percentage(&self) -> u8 {
        self.lock().percentage
    }

    pub fn progress(&self) -> (i64, i64) {
        let state = self.lock();
        (state.current, state.total)
    }

    pub fn is_finished(&self) -> bool {
        self.lock().percentage == 100
    }

    pub fn style(&self) -> BarStyle {
        self.lock().style
    }

    /// Replace the style. `None` restores [`BarStyle::default`]; a glyph count
    /// other than five is rejected and the current style is kept.
    pub fn set_style(&self, glyphs: Option<&str>) -> Result<()> {
        let style = match glyphs {
            Some(glyphs) => BarStyle::parse(glyphs)?,
            None => BarStyle::default(),
        };
        self.lock().style = style;
        Ok(())
    }

    /// Render into at most `width` columns. A finished bar shows a short
    /// marker in `done_color` instead of glyphs.
    pub fn render(&self, width: usize, done_color: Option<AnsiColor>) -> String {
        if width <= 2 {
            return String::new();
        }
        let state = self.lock();
        if state.percentage == 100 {
            return maybe_colorize(done_color, FINISHED_MARKER);
        }

        let (filled, tip, remaining) = segments(width - 2, state.percentage);
        let style = state.style;
        let mut out = String::with_capacity(width * 3);
        out.push(style.left);
        out.extend(std::iter::repeat_n(style.fill, filled));
        if tip {
            out.push(style.tip);
        }
        out.extend(std::iter::repeat_n(style.space, remaining));
        out.push(style.right);
        out
    }
}

/// Split `usable` columns into fill, tip and space. The tip column is folded
/// into the fill once the fill covers every column.
fn segments(usable: usize, percentage: u8) -> (usize, bool, usize) {
    let filled = (usable * percentage as usize / 100).min(usable);
    if filled == usable {
        (usable, false, 0)
    } else {
        (filled, true, usable - 1 - filled)
    }
}

fn percentage_of(current: i64, total: i64) -> u8 {
    (current.saturating_mul(100) / total).clamp(0, 100) as u8
}

fn units_for(percentage: i64, total: i64) -> i64 {
    total.saturating_mul(percentage) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_at(pct: i64) -> ProgressBar {
        let bar = ProgressBar::new(100, BarStyle::default());
        bar.set_percentage(pct);
        bar
    }

    #[test]
    fn half_full_bar_reserves_a_tip_column() {
        let bar = bar_at(50);
        assert_eq!(bar.render(12, None), "╢▌▌▌▌▌▌░░░░╟");
    }

    #[test]
    fn simple_style_renders_ascii() {
        let bar = ProgressBar::new(10, BarStyle::parse(SIMPLE_STYLE).unwrap());
        bar.set_progress(3);
        assert_eq!(bar.percentage(), 30);
        assert_eq!(bar.render(12, None), "[===>------]");
    }

    #[test]
    fn narrow_widths_render_nothing() {
        for pct in [0, 1, 50, 99, 100] {
            let bar = bar_at(pct);
            for width in 0..=2 {
                assert_eq!(bar.render(width, None), "", "pct={pct} width={width}");
            }
        }
    }

    #[test]
    fn done_marker_follows_requested_color() {
        let bar = bar_at(100);
        assert_eq!(bar.render(20, None), " Done");
        assert_eq!(bar.render(20, Some(AnsiColor::Green)), "\x1b[32m Done\x1b[0m");
    }

    #[test]
    fn full_fill_absorbs_the_tip_column() {
        assert_eq!(segments(10, 100), (10, false, 0));
        assert_eq!(segments(10, 99), (9, true, 0));
        assert_eq!(segments(10, 50), (5, true, 4));
        assert_eq!(segments(0, 50), (0, false, 0));
        for usable in 1..40 {
            for pct in 0..=100u8 {
                let (filled, tip, remaining) = segments(usable, pct);
                assert_eq!(filled + usize::from(tip) + remaining, usable);
            }
        }
    }

    #[test]
    fn finished_bar_renders_done_marker() {
        let bar = bar_at(100);
        assert!(bar.is_finished());
        for width in [3, 10, 80] {
            let rendered = bar.render(width, None);
            assert!(rendered.contains("Done"));
            assert!(!rendered.contains('▌'));
        }
    }

    #[test]
    fn empty_bar_has_only_tip_and_space() {
        let bar = bar_at(0);
        assert_eq!(bar.render(6, None), "╢▌░░░╟");
        assert_eq!(bar.render(3, None), "╢▌╟");
    }

    #[test]
    fn percentage_is_clamped() {
        let bar = bar_at(250);
        assert_eq!(bar.percentage(), 100);
        bar.set_percentage(-5);
        assert_eq!(bar.percentage(), 0);
        for _ in 0..30 {
            bar.add_percentage(7);
        }
        assert_eq!(bar.percentage(), 100);
        bar.add_percentage(-300);
        assert_eq!(bar.percentage(), 0);
    }

    #[test]
    fn add_progress_stops_at_total() {
        let bar = ProgressBar::new(40, BarStyle::default());
        bar.add_progress(10);
        assert_eq!(bar.percentage(), 25);
        bar.add_progress(100);
        assert_eq!(bar.progress(), (40, 40));
        assert!(bar.is_finished());
    }

    #[test]
    fn percentage_updates_track_units() {
        let bar = ProgressBar::new(200, BarStyle::default());
        bar.set_percentage(25);
        assert_eq!(bar.progress(), (50, 200));
    }

    #[test]
    fn invalid_style_is_rejected_without_mutation() {
        let bar = ProgressBar::new(10, BarStyle::parse(SIMPLE_STYLE).unwrap());
        let err = bar.set_style(Some("[=>]")).unwrap_err();
        assert!(matches!(err, ScopeError::InvalidBarStyle { found: 4 }));
        assert_eq!(bar.style().to_string(), SIMPLE_STYLE);

        bar.set_style(None).unwrap();
        assert_eq!(bar.style().to_string(), DEFAULT_STYLE);
    }
}
