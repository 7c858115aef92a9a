use std::sync::{
    Arc, Condvar, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::{Duration, Instant};

use crate::bar::ProgressBar;
use crate::config::RendererConfig;
use crate::style::{AnsiColor, format_duration_with, maybe_colorize};
use crate::width::{display_width, starts_with_wide_glyph};

const INDENT_STEP: usize = 2;
const ELLIPSIS: &str = "...";

struct NodeState {
    title: String,
    status: String,
    title_color: Option<AnsiColor>,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    description: Vec<String>,
    visible_lines: isize,
    children: Vec<Arc<Node>>,
    progress: Option<Arc<ProgressBar>>,
}

impl NodeState {
    fn is_running(&self) -> bool {
        self.started_at.is_some() && self.ended_at.is_none()
    }

    fn elapsed(&self) -> Duration {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Description lines as displayed: the open (empty) trailing segment is
    /// dropped and the window is applied.
    fn visible_description(&self) -> Vec<String> {
        let mut lines = self.description.as_slice();
        if let Some((last, rest)) = lines.split_last() {
            if last.is_empty() {
                lines = rest;
            }
        }
        match usize::try_from(self.visible_lines) {
            Ok(window) if lines.len() > window => {
                let mut out = Vec::with_capacity(window + 1);
                out.push(ELLIPSIS.to_string());
                out.extend_from_slice(&lines[lines.len() - window..]);
                out
            }
            _ => lines.to_vec(),
        }
    }
}

/// One scope in the rendered tree.
///
/// Every field is behind the node's own reader/writer lock; the optional
/// progress bar additionally carries its own narrower lock.
pub struct Node {
    state: RwLock<NodeState>,
    config: Arc<RendererConfig>,
    width: Option<usize>,
    is_root: bool,
    completed: Mutex<bool>,
    completion: Condvar,
}

impl Node {
    /// Create the synthetic root. It is never rendered itself and keeps its
    /// children when it finishes successfully.
    pub fn root(config: Arc<RendererConfig>, width: Option<usize>) -> Arc<Self> {
        Arc::new(Self::build("root", config, width, true))
    }

    pub fn new(title: impl Into<String>, config: Arc<RendererConfig>, width: Option<usize>) -> Self {
        Self::build(title, config, width, false)
    }

    fn build(
        title: impl Into<String>,
        config: Arc<RendererConfig>,
        width: Option<usize>,
        is_root: bool,
    ) -> Self {
        let state = NodeState {
            title: title.into(),
            status: config.pending_glyph.clone(),
            title_color: config.colors.neutral,
            started_at: None,
            ended_at: None,
            description: Vec::new(),
            visible_lines: config.default_visible_lines,
            children: Vec::new(),
            progress: None,
        };
        Self {
            state: RwLock::new(state),
            config,
            width,
            is_root,
            completed: Mutex::new(false),
            completion: Condvar::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn config(&self) -> &Arc<RendererConfig> {
        &self.config
    }

    pub fn title(&self) -> String {
        self.read().title.clone()
    }

    pub fn update_title(&self, title: impl Into<String>) {
        self.write().title = title.into();
    }

    pub fn status(&self) -> String {
        self.read().status.clone()
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.write().status = status.into();
    }

    pub fn title_color(&self) -> Option<AnsiColor> {
        self.read().title_color
    }

    pub fn set_title_color(&self, color: Option<AnsiColor>) {
        self.write().title_color = color;
    }

    pub fn children(&self) -> Vec<Arc<Node>> {
        self.read().children.clone()
    }

    pub fn clear_all_children(&self) {
        self.write().children.clear();
    }

    /// Return the most recently added child titled `title`, appending a new
    /// one when none exists.
    pub fn find_or_create_child(&self, title: &str) -> Arc<Node> {
        let mut state = self.write();
        if let Some(child) = state.children.iter().rev().find(|c| c.title() == title) {
            return Arc::clone(child);
        }
        let child = Arc::new(Node::new(title, Arc::clone(&self.config), self.width));
        state.children.push(Arc::clone(&child));
        child
    }

    pub fn add_child(&self, child: Arc<Node>) {
        self.write().children.push(child);
    }

    /// Append an already started child without title lookup.
    pub fn start_new_child(&self, title: impl Into<String>) -> Arc<Node> {
        let child = Arc::new(Node::new(title, Arc::clone(&self.config), self.width));
        child.start(0);
        self.add_child(Arc::clone(&child));
        child
    }

    /// Record the start time once; attach a progress bar when `total > 0` and
    /// none exists yet.
    pub fn start(&self, total: i64) {
        let mut state = self.write();
        if state.started_at.is_none() {
            state.started_at = Some(Instant::now());
        }
        if total > 0 && state.progress.is_none() {
            state.progress = Some(Arc::new(ProgressBar::new(total, self.config.bar_style)));
        }
    }

    pub fn progress(&self) -> Option<Arc<ProgressBar>> {
        self.read().progress.clone()
    }

    /// Finish the scope. The first call wins; later calls change nothing.
    ///
    /// A successful non-root node drops its children and description so it
    /// collapses to its title line. A failed node widens its description
    /// window so the failure context stays on screen.
    pub fn finish(&self, success: bool) {
        let mut state = self.write();
        if state.ended_at.is_some() {
            return;
        }
        if success {
            if !self.is_root {
                state.children.clear();
                state.description.clear();
            }
            let glyph = self.config.success_glyph.clone();
            self.mark_complete(&mut state, Some((glyph, self.config.colors.success)));
        } else {
            state.visible_lines = self.config.failure_visible_lines;
            let glyph = self.config.failure_glyph.clone();
            self.mark_complete(&mut state, Some((glyph, self.config.colors.failure)));
        }
    }

    pub fn complete_with_color(&self, status: impl Into<String>, color: Option<AnsiColor>) {
        let mut state = self.write();
        if state.ended_at.is_none() {
            self.mark_complete(&mut state, Some((status.into(), color)));
        }
    }

    /// Mark the node complete, keeping its current status and color.
    pub fn complete(&self) {
        let mut state = self.write();
        if state.ended_at.is_none() {
            self.mark_complete(&mut state, None);
        }
    }

    fn mark_complete(&self, state: &mut NodeState, look: Option<(String, Option<AnsiColor>)>) {
        let now = Instant::now();
        state.ended_at = Some(now);
        if state.started_at.is_none() {
            state.started_at = Some(now);
        }
        if let Some((status, color)) = look {
            state.status = status;
            state.title_color = color;
        }
        let mut done = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        *done = true;
        self.completion.notify_all();
    }

    pub fn has_started(&self) -> bool {
        self.read().started_at.is_some()
    }

    pub fn has_completed(&self) -> bool {
        self.read().ended_at.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.read().is_running()
    }

    /// Time since start while running, or the total run time once finished.
    pub fn execution_duration(&self) -> Duration {
        self.read().elapsed()
    }

    /// Block until this node completes. Children are not waited for.
    pub fn wait_completion(&self) {
        let mut done = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            done = self
                .completion
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`Node::wait_completion`] with an upper bound; returns whether the
    /// node completed in time.
    pub fn wait_completion_timeout(&self, timeout: Duration) -> bool {
        let done = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        let (done, _) = self
            .completion
            .wait_timeout_while(done, timeout, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
        *done
    }

    pub fn description(&self) -> Vec<String> {
        self.read().description.clone()
    }

    pub fn description_len(&self) -> usize {
        self.read().description.len()
    }

    pub fn set_description(&self, lines: Vec<String>) {
        self.write().description = lines;
    }

    pub fn clear_description(&self) {
        self.write().description.clear();
    }

    pub fn visible_description_lines(&self) -> isize {
        self.read().visible_lines
    }

    /// Negative values show every line.
    pub fn set_visible_description_lines(&self, count: isize) {
        self.write().visible_lines = count;
    }

    /// Append possibly multi-line text. The first segment continues the last
    /// existing line, so partial lines can be streamed across calls. Ignored
    /// once the node has completed.
    pub fn append_description(&self, text: &str) {
        let mut state = self.write();
        if state.ended_at.is_some() {
            return;
        }
        let mut segments = text
            .split('\n')
            .map(|s| s.strip_suffix('\r').unwrap_or(s).to_string());
        let Some(first) = segments.next() else {
            return;
        };
        match state.description.last_mut() {
            Some(last) => last.push_str(&first),
            None => state.description.push(first),
        }
        state.description.extend(segments);
    }

    /// Render this node, then its children, then its description.
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.render_into(0, &mut lines);
        lines
    }

    pub(crate) fn render_into(&self, indent: usize, out: &mut Vec<String>) {
        let (title, children, description) = {
            let state = self.read();
            (
                self.title_line(&state, indent),
                state.children.clone(),
                state.visible_description(),
            )
        };

        let mut nested = indent + INDENT_STEP;
        if starts_with_wide_glyph(&title[indent..]) {
            nested += 1;
        }

        out.push(title);
        for child in &children {
            child.render_into(nested, out);
        }
        let pad = " ".repeat(nested);
        out.extend(description.into_iter().map(|line| format!("{pad}{line}")));
    }

    fn title_line(&self, state: &NodeState, indent: usize) -> String {
        let glyph = if state.is_running() {
            self.config.current_spinner_frame()
        } else {
            state.status.as_str()
        };
        let title = maybe_colorize(state.title_color, &state.title);
        let fine = state.children.is_empty();
        let duration =
            format_duration_with(state.elapsed(), fine, self.config.fine_duration_threshold);

        let mut line = format!("{:indent$}{glyph} {title} {duration}", "");
        if let Some(bar) = &state.progress {
            let width = self.width.unwrap_or(self.config.fallback_width);
            let budget = width.saturating_sub(display_width(&line));
            line.push_str(&bar.render(budget, self.config.colors.success));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ColorScheme;

    fn plain_config() -> Arc<RendererConfig> {
        Arc::new(
            RendererConfig::windows()
                .with_colors(ColorScheme::plain())
                .with_spinner(vec!["*".to_string()], Duration::from_secs(1)),
        )
    }

    fn node(title: &str) -> Node {
        Node::new(title, plain_config(), Some(80))
    }

    #[test]
    fn find_or_create_reuses_same_title() {
        let root = Node::root(plain_config(), None);
        let a = root.find_or_create_child("build");
        let again = root.find_or_create_child("build");
        assert!(Arc::ptr_eq(&a, &again));

        let b = root.find_or_create_child("test");
        let titles: Vec<_> = root.children().iter().map(|c| c.title()).collect();
        assert_eq!(titles, vec!["build", "test"]);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn find_prefers_most_recent_duplicate() {
        let root = Node::root(plain_config(), None);
        root.find_or_create_child("job");
        let second = Arc::new(Node::new("job", plain_config(), None));
        root.add_child(Arc::clone(&second));
        assert!(Arc::ptr_eq(&root.find_or_create_child("job"), &second));
        assert_eq!(root.children().len(), 2);
    }

    #[test]
    fn streaming_description_joins_partial_lines() {
        let n = node("job");
        n.append_description("abc");
        n.append_description("def\nghi");
        assert_eq!(n.description(), vec!["abcdef", "ghi"]);
    }

    #[test]
    fn crlf_segments_are_trimmed() {
        let n = node("job");
        n.append_description("one\r\ntwo\r\n");
        assert_eq!(n.description(), vec!["one", "two", ""]);
    }

    #[test]
    fn finish_is_idempotent() {
        let n = node("job");
        n.start(0);
        n.finish(false);
        let status = n.status();
        let color = n.title_color();
        let duration = n.execution_duration();
        std::thread::sleep(Duration::from_millis(5));
        n.finish(true);
        assert_eq!(n.status(), status);
        assert_eq!(n.title_color(), color);
        assert_eq!(n.execution_duration(), duration);
        assert_eq!(n.status(), "-");
    }

    #[test]
    fn completing_unstarted_node_backfills_start() {
        let n = node("job");
        n.complete();
        assert!(n.has_started());
        assert!(n.has_completed());
        assert_eq!(n.execution_duration(), Duration::ZERO);
    }

    #[test]
    fn start_is_idempotent_and_creates_bar_once() {
        let n = node("job");
        assert!(!n.has_started());
        n.start(0);
        assert!(n.progress().is_none());
        n.start(10);
        let bar = n.progress().expect("bar");
        n.start(50);
        assert!(Arc::ptr_eq(&bar, &n.progress().unwrap()));
        assert!(n.is_running());
    }

    #[test]
    fn description_ignored_after_completion() {
        let n = node("job");
        n.append_description("before\n");
        n.finish(false);
        n.append_description("after\n");
        assert_eq!(n.description(), vec!["before", ""]);
    }

    #[test]
    fn successful_child_collapses() {
        let root = Node::root(plain_config(), None);
        let parent = root.find_or_create_child("parent");
        parent.start(0);
        parent.find_or_create_child("child").start(0);
        parent.append_description("noise\n");
        parent.finish(true);

        let lines = parent.render();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("+ parent "));
    }

    #[test]
    fn root_keeps_children_on_success() {
        let root = Node::root(plain_config(), None);
        root.find_or_create_child("kept");
        root.finish(true);
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn failure_keeps_wide_window_of_recent_lines() {
        let n = node("job");
        n.start(0);
        for i in 0..150 {
            n.append_description(&format!("line {i}\n"));
        }
        n.finish(false);

        let lines = n.render();
        assert_eq!(lines[1], "  ...");
        assert_eq!(lines.len(), 1 + 1 + 100);
        assert_eq!(lines[2], "  line 50");
        assert_eq!(lines.last().unwrap(), "  line 149");
    }

    #[test]
    fn running_node_truncates_to_default_window() {
        let n = node("job");
        n.start(0);
        for i in 0..8 {
            n.append_description(&format!("m{i}\n"));
        }
        let lines = n.render();
        assert_eq!(&lines[1..], &["  ...", "  m3", "  m4", "  m5", "  m6", "  m7"]);
    }

    #[test]
    fn negative_window_shows_everything() {
        let n = node("job");
        n.set_visible_description_lines(-1);
        for i in 0..8 {
            n.append_description(&format!("m{i}\n"));
        }
        assert_eq!(n.render().len(), 9);
    }

    #[test]
    fn render_order_is_title_children_description() {
        let root = Node::root(plain_config(), None);
        let parent = root.find_or_create_child("parent");
        parent.start(0);
        parent.append_description("parent says\n");
        let child = parent.find_or_create_child("child");
        child.start(0);
        child.append_description("child says\n");

        let lines = parent.render();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("* parent "));
        assert!(lines[1].starts_with("  * child "));
        assert_eq!(lines[2], "    child says");
        assert_eq!(lines[3], "  parent says");
    }

    #[test]
    fn wide_status_glyph_adds_indent_column() {
        let config = Arc::new(
            RendererConfig::unix()
                .with_colors(ColorScheme::plain())
                .with_spinner(vec!["🕐".to_string()], Duration::from_secs(1)),
        );
        let n = Node::new("job", config, Some(80));
        n.start(0);
        n.append_description("detail\n");
        let lines = n.render();
        assert_eq!(lines[1], "   detail");
    }

    #[test]
    fn fine_duration_only_without_children() {
        let n = node("job");
        n.complete();
        assert!(n.render()[0].ends_with(" 0.0s"));

        let parent = node("parent");
        parent.start_new_child("child");
        parent.complete();
        assert!(parent.render()[0].ends_with(" 0s"));
    }

    #[test]
    fn progress_bar_fills_remaining_width() {
        let n = Node::new("job", plain_config(), Some(30));
        n.start(100);
        n.progress().unwrap().set_percentage(50);
        let line = n.render().remove(0);
        assert_eq!(display_width(&line), 30);
        assert!(line.ends_with("░╟"));
    }

    #[test]
    fn finished_bar_stays_plain_without_colors() {
        let n = Node::new("job", plain_config(), Some(30));
        n.start(100);
        n.progress().unwrap().set_percentage(100);
        let line = n.render().remove(0);
        assert!(line.ends_with(" Done"));
        assert!(!line.contains('\x1b'));
    }

    #[test]
    fn wait_completion_returns_after_finish() {
        let n = Arc::new(node("job"));
        let waiter = {
            let n = Arc::clone(&n);
            std::thread::spawn(move || n.wait_completion())
        };
        n.finish(true);
        waiter.join().unwrap();
        assert!(n.wait_completion_timeout(Duration::from_millis(1)));
    }
}
