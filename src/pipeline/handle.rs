use std::ops::Deref;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use serde_json::json;

use crate::error::{Result, ScopeError};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::event::{ProgressUpdate, Renderer, ScopeEvent};

/// Total used for scopes without a progress bar.
pub const NO_PROGRESS: i64 = 0;
/// Total used by [`ScopeHandle::bar`]; percentage updates map 1:1 onto it.
pub const DEFAULT_PROGRESS_TOTAL: i64 = 100;

const LOG_TARGET: &str = "scopetree::pipeline";

enum Envelope {
    Event(ScopeEvent),
    Barrier(mpsc::Sender<()>),
}

/// Owns the consumer thread. Scope handles obtained from [`Pipeline::root`]
/// feed it.
pub struct Pipeline {
    sender: SyncSender<Envelope>,
    level: LogLevel,
    consumer: JoinHandle<()>,
}

impl Pipeline {
    /// Start the consumer thread applying events to `renderer`. Handles only
    /// emit messages at or above `level`.
    pub fn spawn(renderer: Arc<dyn Renderer>, level: LogLevel) -> Result<Self> {
        Self::spawn_logged(renderer, level, None)
    }

    pub fn spawn_logged(
        renderer: Arc<dyn Renderer>,
        level: LogLevel,
        logger: Option<Logger>,
    ) -> Result<Self> {
        // zero capacity: every emit is a blocking handoff to the consumer
        let (sender, receiver) = mpsc::sync_channel(0);
        let consumer = thread::Builder::new()
            .name("scopetree-pipeline".to_string())
            .spawn(move || consume(receiver, renderer, logger))?;
        Ok(Self {
            sender,
            level,
            consumer,
        })
    }

    /// Handle for the root scope (empty path).
    pub fn root(&self) -> ScopeHandle {
        ScopeHandle {
            level: self.level,
            path: Vec::new(),
            sender: self.sender.clone(),
        }
    }

    /// Wait for the consumer to drain. Returns once every handle has been
    /// dropped and all their events have been applied.
    pub fn join(self) -> Result<()> {
        drop(self.sender);
        self.consumer.join().map_err(|_| ScopeError::ConsumerThread)
    }
}

fn consume(receiver: Receiver<Envelope>, renderer: Arc<dyn Renderer>, logger: Option<Logger>) {
    let mut dispatched: u64 = 0;
    for envelope in receiver {
        match envelope {
            Envelope::Event(event) => {
                if let Some(logger) = logger.as_ref() {
                    let log = event_with_fields(
                        LogLevel::Trace,
                        LOG_TARGET,
                        "event_dispatched",
                        [
                            json_kv("kind", json!(event_kind(&event))),
                            json_kv("depth", json!(event.path().len())),
                        ],
                    );
                    let _ = logger.log_event(log);
                }
                event.dispatch(renderer.as_ref());
                dispatched += 1;
            }
            Envelope::Barrier(ack) => {
                let _ = ack.send(());
            }
        }
    }
    if let Some(logger) = logger.as_ref() {
        let log = event_with_fields(
            LogLevel::Debug,
            LOG_TARGET,
            "pipeline_closed",
            [json_kv("events", json!(dispatched))],
        );
        let _ = logger.log_event(log);
    }
}

fn event_kind(event: &ScopeEvent) -> &'static str {
    match event {
        ScopeEvent::Started { .. } => "started",
        ScopeEvent::Finished { .. } => "finished",
        ScopeEvent::Message { .. } => "message",
        ScopeEvent::Progress { .. } => "progress",
    }
}

/// A producer's view of one scope.
///
/// Cloning a handle yields another producer for the same scope. Every opened
/// scope must eventually be finished (see [`ScopeGuard`]), otherwise its
/// ancestors, and therefore the draw loop, never complete.
#[derive(Clone)]
pub struct ScopeHandle {
    level: LogLevel,
    path: Vec<String>,
    sender: SyncSender<Envelope>,
}

impl ScopeHandle {
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        level.is_enabled_at(self.level)
    }

    fn emit(&self, event: ScopeEvent) {
        // a closed consumer means the session is over; nothing to report to
        let _ = self.sender.send(Envelope::Event(event));
    }

    /// Open a child scope. Its `Started` event has been handed to the consumer
    /// by the time the handle is returned.
    pub fn scoped(&self, name: impl Into<String>) -> ScopeHandle {
        self.scoped_with_total(name, NO_PROGRESS)
    }

    /// Open a child scope with a progress bar of `total` units.
    pub fn scoped_with_total(&self, name: impl Into<String>, total: i64) -> ScopeHandle {
        let mut path = self.path.clone();
        path.push(name.into());
        self.emit(ScopeEvent::Started {
            path: path.clone(),
            total,
        });
        ScopeHandle {
            level: self.level,
            path,
            sender: self.sender.clone(),
        }
    }

    /// Open a child scope with a percentage-driven progress bar.
    pub fn bar(&self, name: impl Into<String>) -> ScopeHandle {
        self.scoped_with_total(name, DEFAULT_PROGRESS_TOTAL)
    }

    pub fn log(&self, level: LogLevel, text: impl Into<String>) {
        if self.is_level_enabled(level) {
            self.emit(ScopeEvent::Message {
                path: self.path.clone(),
                level,
                text: text.into(),
            });
        }
    }

    pub fn trace(&self, text: impl Into<String>) {
        self.log(LogLevel::Trace, text);
    }

    pub fn debug(&self, text: impl Into<String>) {
        self.log(LogLevel::Debug, text);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.log(LogLevel::Info, text);
    }

    pub fn warn(&self, text: impl Into<String>) {
        self.log(LogLevel::Warn, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.log(LogLevel::Error, text);
    }

    pub fn finish(&self, success: bool) {
        self.emit(ScopeEvent::Finished {
            path: self.path.clone(),
            success,
        });
    }

    fn progress(&self, update: ProgressUpdate) {
        self.emit(ScopeEvent::Progress {
            path: self.path.clone(),
            update,
        });
    }

    pub fn set_progress(&self, value: i64) {
        self.progress(ProgressUpdate::SetProgress(value));
    }

    pub fn add_progress(&self, delta: i64) {
        self.progress(ProgressUpdate::AddProgress(delta));
    }

    pub fn set_percentage(&self, percentage: i64) {
        self.progress(ProgressUpdate::SetPercentage(percentage));
    }

    pub fn add_percentage(&self, delta: i64) {
        self.progress(ProgressUpdate::AddPercentage(delta));
    }

    /// Block until everything emitted before this call has been applied.
    pub fn flush(&self) {
        let (ack, done) = mpsc::channel();
        if self.sender.send(Envelope::Barrier(ack)).is_ok() {
            let _ = done.recv();
        }
    }

    /// Wrap the handle so the scope is finished as failed if it is dropped
    /// without an explicit outcome.
    pub fn guard(self) -> ScopeGuard {
        ScopeGuard {
            handle: self,
            finished: false,
        }
    }
}

/// Finishes its scope exactly once, as failed when dropped unresolved.
pub struct ScopeGuard {
    handle: ScopeHandle,
    finished: bool,
}

impl ScopeGuard {
    pub fn complete(mut self, success: bool) {
        self.finished = true;
        self.handle.finish(success);
    }

    pub fn succeed(self) {
        self.complete(true);
    }

    pub fn fail(self) {
        self.complete(false);
    }

    /// Same as [`ScopeGuard::complete`]. Shadows [`ScopeHandle::finish`] so a
    /// finish through the guard disarms it.
    pub fn finish(self, success: bool) {
        self.complete(success);
    }
}

impl Deref for ScopeGuard {
    type Target = ScopeHandle;

    fn deref(&self) -> &ScopeHandle {
        &self.handle
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.handle.finish(false);
        }
    }
}
