use std::io::{self, BufWriter, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::RendererConfig;
use crate::cursor;
use crate::diff::{DiffEngine, DiffOutcome};
use crate::error::Result;
use crate::frame::render_frame;
use crate::metrics::{MetricSnapshot, RenderMetrics};
use crate::pipeline::{ProgressUpdate, Renderer};
use crate::terminal::{CrosstermTerminal, TerminalAccess};
use crate::tree::Node;

const OUTPUT_BUFFER_BYTES: usize = 38_400;

struct DrawState {
    out: BufWriter<Box<dyn Write + Send>>,
    engine: DiffEngine,
}

/// Keeps the scope tree and redraws it in place.
///
/// Scope events mutate the tree; [`InteractiveRenderer::draw_frame`] renders
/// it and writes the difference against the previous frame. Draw calls are
/// serialized by their own lock, separate from the per-node locks, so a
/// periodic redraw and the final flush never interleave their output.
pub struct InteractiveRenderer {
    root: Arc<Node>,
    terminal: Box<dyn TerminalAccess>,
    draw: Mutex<DrawState>,
    metrics: Mutex<RenderMetrics>,
}

impl InteractiveRenderer {
    /// Build a renderer writing to `out`. Terminal dimensions are sampled once
    /// from `terminal`: the width sizes progress bars, the height bounds the
    /// redraw window.
    pub fn new<P, W>(config: RendererConfig, terminal: P, out: W) -> Self
    where
        P: TerminalAccess + 'static,
        W: Write + Send + 'static,
    {
        let size = terminal.size();
        let root = Node::root(Arc::new(config), size.columns.map(usize::from));
        let engine = DiffEngine::new(size.rows.map(usize::from));
        let out: Box<dyn Write + Send> = Box::new(out);
        Self {
            root,
            terminal: Box::new(terminal),
            draw: Mutex::new(DrawState {
                out: BufWriter::with_capacity(OUTPUT_BUFFER_BYTES, out),
                engine,
            }),
            metrics: Mutex::new(RenderMetrics::new()),
        }
    }

    /// Renderer on the process's stdout.
    pub fn stdout(config: RendererConfig) -> Self {
        Self::new(config, CrosstermTerminal, io::stdout())
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    fn lock_draw(&self) -> MutexGuard<'_, DrawState> {
        self.draw.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_metrics(&self) -> MutexGuard<'_, RenderMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_scoped_node(&self, path: &[String]) -> Arc<Node> {
        let mut node = Arc::clone(&self.root);
        for name in path {
            node = node.find_or_create_child(name);
        }
        node
    }

    /// One-time terminal setup before the first frame: platform preparation,
    /// then line wrapping is switched off so long lines cannot shift the rows
    /// the next redraw walks over.
    ///
    /// A preparation failure is returned after wrapping has been disabled;
    /// drawing can still go ahead.
    pub fn prime(&self) -> Result<()> {
        let prepared = self.terminal.prepare();
        let mut draw = self.lock_draw();
        draw.out.write_all(cursor::disable_autowrap().as_bytes())?;
        draw.out.flush()?;
        prepared
    }

    /// Turn line wrapping back on once drawing is over.
    pub fn restore(&self) -> Result<()> {
        let mut draw = self.lock_draw();
        draw.out.write_all(cursor::enable_autowrap().as_bytes())?;
        draw.out.flush()?;
        Ok(())
    }

    /// Render the tree and write what changed since the last frame.
    pub fn draw_frame(&self) -> Result<DiffOutcome> {
        let mut draw = self.lock_draw();
        let frame = render_frame(&self.root);
        let DrawState { out, engine } = &mut *draw;
        let outcome = engine.update(out, frame)?;
        out.flush()?;
        self.lock_metrics().record_frame(
            outcome.lines_written,
            outcome.lines_skipped,
            outcome.bytes,
        );
        Ok(outcome)
    }

    /// Mark the root complete and draw the last frame.
    pub fn stop_drawing(&self) -> Result<DiffOutcome> {
        self.root.complete();
        self.draw_frame()
    }

    pub fn metrics_snapshot(&self, uptime: Duration) -> MetricSnapshot {
        self.lock_metrics().snapshot(uptime)
    }
}

impl Renderer for InteractiveRenderer {
    fn render_scope_started(&self, path: &[String], total: i64) {
        self.find_scoped_node(path).start(total);
        self.lock_metrics().record_event();
    }

    fn render_scope_finished(&self, path: &[String], success: bool) {
        self.find_scoped_node(path).finish(success);
        self.lock_metrics().record_event();
    }

    fn render_message(&self, path: &[String], text: &str) {
        self.find_scoped_node(path)
            .append_description(&format!("{text}\n"));
        self.lock_metrics().record_event();
    }

    fn render_progress(&self, path: &[String], update: ProgressUpdate) {
        if let Some(bar) = self.find_scoped_node(path).progress() {
            update.apply(&bar);
        }
        self.lock_metrics().record_event();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ColorScheme;
    use crate::terminal::{FixedTerminal, TerminalSize};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn take(&self) -> String {
            let bytes = std::mem::take(&mut *self.0.lock().unwrap());
            String::from_utf8(bytes).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn config() -> RendererConfig {
        RendererConfig::windows()
            .with_colors(ColorScheme::plain())
            .with_spinner(vec!["*".to_string()], Duration::from_secs(1))
    }

    fn renderer(size: TerminalSize) -> (InteractiveRenderer, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let renderer = InteractiveRenderer::new(config(), FixedTerminal::new(size), buffer.clone());
        (renderer, buffer)
    }

    fn path(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prime_disables_line_wrap() {
        let (renderer, buffer) = renderer(TerminalSize::UNKNOWN);
        renderer.prime().unwrap();
        assert_eq!(buffer.take(), "\x1b[?7l");
        renderer.restore().unwrap();
        assert_eq!(buffer.take(), "\x1b[?7h");
    }

    #[test]
    fn events_build_nested_nodes() {
        let (renderer, _) = renderer(TerminalSize::UNKNOWN);
        renderer.render_scope_started(&path(&["build", "compile"]), 0);
        renderer.render_message(&path(&["build", "compile"]), "cc main.c");

        let build = renderer.root().find_or_create_child("build");
        assert!(!build.has_started());
        let compile = build.find_or_create_child("compile");
        assert!(compile.is_running());
        assert_eq!(compile.description(), vec!["cc main.c", ""]);
    }

    #[test]
    fn progress_without_bar_is_ignored() {
        let (renderer, _) = renderer(TerminalSize::UNKNOWN);
        renderer.render_scope_started(&path(&["plain"]), 0);
        renderer.render_progress(&path(&["plain"]), ProgressUpdate::SetPercentage(50));
        renderer.render_scope_started(&path(&["bar"]), 100);
        renderer.render_progress(&path(&["bar"]), ProgressUpdate::SetPercentage(50));

        let root = renderer.root();
        assert!(root.find_or_create_child("plain").progress().is_none());
        let bar = root.find_or_create_child("bar").progress().unwrap();
        assert_eq!(bar.percentage(), 50);
        assert_eq!(renderer.metrics_snapshot(Duration::ZERO).events, 4);
    }

    #[test]
    fn second_frame_only_rewrites_changes() {
        let (renderer, buffer) = renderer(TerminalSize::new(80, 24));
        renderer.render_scope_started(&path(&["a"]), 0);
        renderer.render_scope_started(&path(&["b"]), 0);
        let first = renderer.draw_frame().unwrap();
        assert_eq!(first.lines_written, 2);
        let text = buffer.take();
        assert!(text.starts_with("* a "));

        renderer.render_message(&path(&["b"]), "hello");
        let second = renderer.draw_frame().unwrap();
        assert!(second.lines_written >= 1);
        assert!(buffer.take().ends_with("  hello\x1b[K\n"));
    }

    #[test]
    fn stop_drawing_completes_root() {
        let (renderer, buffer) = renderer(TerminalSize::UNKNOWN);
        renderer.render_scope_started(&path(&["job"]), 0);
        renderer.render_scope_finished(&path(&["job"]), true);
        renderer.stop_drawing().unwrap();
        assert!(renderer.root().has_completed());
        assert!(buffer.take().starts_with("+ job "));
        let snapshot = renderer.metrics_snapshot(Duration::from_millis(10));
        assert_eq!(snapshot.frames, 1);
        assert_eq!(snapshot.lines_written, 1);
    }

    #[test]
    fn root_finish_keeps_children_visible() {
        let (renderer, _) = renderer(TerminalSize::UNKNOWN);
        renderer.render_scope_started(&path(&["job"]), 0);
        renderer.render_scope_finished(&[], true);
        assert!(renderer.root().has_completed());
        assert_eq!(render_frame(renderer.root()).len(), 1);
    }
}
