use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::pipeline::{ProgressUpdate, Renderer};
use crate::style::{ColorScheme, FINE_DURATION_THRESHOLD, format_duration_with, maybe_colorize};

/// Line-per-event renderer for output that cannot be redrawn.
///
/// Progress updates are dropped. Start times are keyed by the joined scope
/// path, so a repeated start of the same path prints nothing.
pub struct SimpleRenderer {
    out: Mutex<Box<dyn Write + Send>>,
    colors: ColorScheme,
    fine_duration_threshold: Duration,
    started: Mutex<HashMap<String, Instant>>,
}

impl SimpleRenderer {
    pub fn new<W>(out: W, colors: ColorScheme) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            out: Mutex::new(Box::new(out)),
            colors,
            fine_duration_threshold: FINE_DURATION_THRESHOLD,
            started: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_fine_duration_threshold(mut self, threshold: Duration) -> Self {
        self.fine_duration_threshold = threshold;
        self
    }

    fn start_times(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.started.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a start was seen for `path`. The root always counts as started,
    /// and finished scopes stay started.
    pub fn scope_has_started(&self, path: &[String]) -> bool {
        path.is_empty() || self.start_times().contains_key(&path.join("/"))
    }

    fn write_line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // output errors have no caller to go to; the next line may still land
        let _ = writeln!(out, "{line}").and_then(|_| out.flush());
    }
}

impl Renderer for SimpleRenderer {
    fn render_scope_started(&self, path: &[String], _total: i64) {
        let Some(name) = path.last() else {
            return;
        };
        {
            let mut started = self.start_times();
            let key = path.join("/");
            if started.contains_key(&key) {
                return;
            }
            started.insert(key, Instant::now());
        }
        let line = format!("Started {}", quoted_if_needed(name));
        self.write_line(&maybe_colorize(self.colors.neutral, &line));
    }

    fn render_scope_finished(&self, path: &[String], success: bool) {
        let Some(name) = path.last() else {
            return;
        };
        let elapsed = self
            .start_times()
            .get(&path.join("/"))
            .map(Instant::elapsed)
            .unwrap_or_default();
        let duration = format_duration_with(elapsed, true, self.fine_duration_threshold);
        let name = quoted_if_needed(name);
        let line = if success {
            maybe_colorize(self.colors.success, &format!("{name} succeeded in {duration}!"))
        } else {
            maybe_colorize(self.colors.failure, &format!("{name} failed in {duration}!"))
        };
        self.write_line(&line);
    }

    fn render_message(&self, _path: &[String], text: &str) {
        self.write_line(text);
    }

    fn render_progress(&self, _path: &[String], _update: ProgressUpdate) {}
}

/// Wrap `name` in single quotes unless it already carries a quote character.
fn quoted_if_needed(name: &str) -> String {
    if name.contains(['\'', '"']) {
        name.to_string()
    } else {
        format!("'{name}'")
    }
}
