//! Visual settings shared by every node of an interactive renderer.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::bar::BarStyle;
use crate::error::Result;
use crate::style::{ColorScheme, FINE_DURATION_THRESHOLD};

const CLOCK_FRAMES: [&str; 12] = [
    "🕐", "🕑", "🕒", "🕓", "🕔", "🕕", "🕖", "🕗", "🕘", "🕙", "🕚", "🕛",
];
const ASCII_FRAMES: [&str; 4] = ["\\", "|", "/", "-"];

/// Rendering knobs for nodes and frames.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub colors: ColorScheme,
    /// Spinner glyphs cycled through while a node is running.
    pub spinner_frames: Vec<String>,
    /// Time for one full pass over `spinner_frames`.
    pub spinner_cycle: Duration,
    pub success_glyph: String,
    pub failure_glyph: String,
    /// Shown for nodes that exist but have not started yet.
    pub pending_glyph: String,
    pub default_visible_lines: isize,
    /// Description window applied to nodes that finish unsuccessfully.
    pub failure_visible_lines: isize,
    pub fine_duration_threshold: Duration,
    pub bar_style: BarStyle,
    /// Column budget for progress bars when the terminal width is unknown.
    pub fallback_width: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        if cfg!(windows) {
            Self::windows()
        } else {
            Self::unix()
        }
    }
}

impl RendererConfig {
    pub fn unix() -> Self {
        Self {
            colors: ColorScheme::default(),
            spinner_frames: CLOCK_FRAMES.iter().map(|f| f.to_string()).collect(),
            spinner_cycle: Duration::from_secs(1),
            success_glyph: "✅".to_string(),
            failure_glyph: "❌".to_string(),
            pending_glyph: "⏸".to_string(),
            default_visible_lines: 5,
            failure_visible_lines: 100,
            fine_duration_threshold: FINE_DURATION_THRESHOLD,
            bar_style: BarStyle::default(),
            fallback_width: 80,
        }
    }

    /// ASCII glyphs for consoles without emoji support.
    pub fn windows() -> Self {
        Self {
            spinner_frames: ASCII_FRAMES.iter().map(|f| f.to_string()).collect(),
            success_glyph: "+".to_string(),
            failure_glyph: "-".to_string(),
            pending_glyph: "~".to_string(),
            ..Self::unix()
        }
    }

    pub fn with_colors(mut self, colors: ColorScheme) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_spinner(mut self, frames: Vec<String>, cycle: Duration) -> Self {
        self.spinner_frames = frames;
        self.spinner_cycle = cycle;
        self
    }

    pub fn with_status_glyphs(mut self, success: &str, failure: &str) -> Self {
        self.success_glyph = success.to_string();
        self.failure_glyph = failure.to_string();
        self
    }

    pub fn with_visible_lines(mut self, default: isize, on_failure: isize) -> Self {
        self.default_visible_lines = default;
        self.failure_visible_lines = on_failure;
        self
    }

    pub fn with_fallback_width(mut self, width: usize) -> Self {
        self.fallback_width = width;
        self
    }

    /// Set the progress bar glyphs; rejects anything but exactly five glyphs
    /// and leaves the config untouched in that case.
    pub fn with_bar_style(mut self, glyphs: &str) -> Result<Self> {
        self.bar_style = BarStyle::parse(glyphs)?;
        Ok(self)
    }

    /// Spinner glyph for the wall-clock instant `now`.
    ///
    /// Frames derive from time alone, so independent renderers animate in step.
    pub fn spinner_frame_at(&self, now: SystemTime) -> &str {
        let Some(first) = self.spinner_frames.first() else {
            return "";
        };
        let frames = self.spinner_frames.len() as u128;
        let cycle = self.spinner_cycle.as_nanos().max(1);
        let per_frame = (cycle / frames).max(1);
        let since_epoch = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let index = (since_epoch % cycle) / per_frame;
        self.spinner_frames
            .get(index as usize)
            .map(String::as_str)
            .unwrap_or(first.as_str())
    }

    pub fn current_spinner_frame(&self) -> &str {
        self.spinner_frame_at(SystemTime::now())
    }
}
