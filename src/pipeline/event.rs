use crate::bar::ProgressBar;
use crate::logging::LogLevel;

/// A change to a scope's progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    SetProgress(i64),
    AddProgress(i64),
    SetPercentage(i64),
    AddPercentage(i64),
}

impl ProgressUpdate {
    pub fn apply(self, bar: &ProgressBar) {
        match self {
            ProgressUpdate::SetProgress(value) => bar.set_progress(value),
            ProgressUpdate::AddProgress(delta) => bar.add_progress(delta),
            ProgressUpdate::SetPercentage(value) => bar.set_percentage(value),
            ProgressUpdate::AddPercentage(delta) => bar.add_percentage(delta),
        }
    }
}

/// One producer call, addressed by the scope's path from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeEvent {
    Started {
        path: Vec<String>,
        total: i64,
    },
    Finished {
        path: Vec<String>,
        success: bool,
    },
    Message {
        path: Vec<String>,
        level: LogLevel,
        text: String,
    },
    Progress {
        path: Vec<String>,
        update: ProgressUpdate,
    },
}

impl ScopeEvent {
    pub fn path(&self) -> &[String] {
        match self {
            ScopeEvent::Started { path, .. }
            | ScopeEvent::Finished { path, .. }
            | ScopeEvent::Message { path, .. }
            | ScopeEvent::Progress { path, .. } => path,
        }
    }

    /// Route the event to the matching renderer operation.
    pub fn dispatch(&self, renderer: &dyn Renderer) {
        match self {
            ScopeEvent::Started { path, total } => renderer.render_scope_started(path, *total),
            ScopeEvent::Finished { path, success } => {
                renderer.render_scope_finished(path, *success)
            }
            ScopeEvent::Message { path, text, .. } => renderer.render_message(path, text),
            ScopeEvent::Progress { path, update } => renderer.render_progress(path, *update),
        }
    }
}

/// The capability a pipeline consumer drives.
pub trait Renderer: Send + Sync {
    fn render_scope_started(&self, path: &[String], total: i64);
    fn render_scope_finished(&self, path: &[String], success: bool);
    fn render_message(&self, path: &[String], text: &str);
    fn render_progress(&self, path: &[String], update: ProgressUpdate);
}
